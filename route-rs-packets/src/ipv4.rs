use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

const MIN_HEADER_LEN: usize = 20;

#[derive(Clone, Debug)]
pub struct Ipv4Packet {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: usize,
    pub payload_offset: usize,
}

impl Packet for Ipv4Packet {}

impl Ipv4Packet {
    fn new(
        mut data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: usize,
    ) -> Result<Ipv4Packet, &'static str> {
        if data.len() < layer3_offset + MIN_HEADER_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }

        let version: u8 = (data[layer3_offset] & 0xF0) >> 4;
        if version != 4 {
            return Err("Packet has incorrect version, is not Ipv4Packet");
        }

        // This is the header length in 32bit words
        let ihl = (data[layer3_offset] & 0x0F) as usize;
        if ihl < 5 {
            return Err("Packet has an IHL shorter than the minimum header");
        }

        let total_len = u16::from_be_bytes(
            data[layer3_offset + 2..=layer3_offset + 3]
                .try_into()
                .unwrap(),
        ) as usize;
        if total_len < ihl * 4 || data.len() < layer3_offset + total_len {
            return Err("Packet has invalid total length field");
        }
        // Short frames arrive with Ethernet trailer padding after the datagram
        data.truncate(layer3_offset + total_len);

        Ok(Ipv4Packet {
            data,
            layer2_offset,
            layer3_offset,
            payload_offset: layer3_offset + (ihl * 4),
        })
    }

    /// Builds a bare 20 byte header with no payload and a valid checksum. The packet has no
    /// layer 2 header; use `EthernetFrame::encap_ipv4` to put it on the wire.
    pub fn new_header(src: Ipv4Addr, dest: Ipv4Addr, protocol: IpProtocol, ttl: u8) -> Ipv4Packet {
        let mut data = vec![0; MIN_HEADER_LEN];
        data[0] = 0x45;
        data[2..4].copy_from_slice(&(MIN_HEADER_LEN as u16).to_be_bytes());
        data[8] = ttl;
        data[9] = protocol.into();
        data[12..16].copy_from_slice(&src.octets());
        data[16..20].copy_from_slice(&dest.octets());

        let mut packet = Ipv4Packet {
            data,
            layer2_offset: None,
            layer3_offset: 0,
            payload_offset: MIN_HEADER_LEN,
        };
        packet.set_checksum();
        packet
    }

    /// Wraps a UDP segment in a fresh header with a valid checksum
    pub fn encap_udp(src: Ipv4Addr, dest: Ipv4Addr, ttl: u8, segment: &UdpSegment) -> Ipv4Packet {
        let mut packet = Ipv4Packet::new_header(src, dest, IpProtocol::UDP, ttl);
        packet.set_payload(segment.as_bytes());
        packet.set_checksum();
        packet
    }

    /// Wraps an ICMP message in a fresh header with a valid checksum
    pub fn encap_icmp(src: Ipv4Addr, dest: Ipv4Addr, ttl: u8, message: &IcmpMessage) -> Ipv4Packet {
        let mut packet = Ipv4Packet::new_header(src, dest, IpProtocol::ICMP, ttl);
        packet.set_payload(message.as_bytes());
        packet.set_checksum();
        packet
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[self.layer3_offset + 12..self.layer3_offset + 16]
            .try_into()
            .unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        self.data[self.layer3_offset + 12..self.layer3_offset + 16].copy_from_slice(&addr.octets());
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[self.layer3_offset + 16..self.layer3_offset + 20]
            .try_into()
            .unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_dest_addr(&mut self, addr: Ipv4Addr) {
        self.data[self.layer3_offset + 16..self.layer3_offset + 20].copy_from_slice(&addr.octets());
    }

    pub fn ihl(&self) -> u8 {
        self.data[self.layer3_offset] & 0x0F
    }

    pub fn header_len(&self) -> usize {
        self.payload_offset - self.layer3_offset
    }

    /// The header bytes including options
    pub fn header(&self) -> &[u8] {
        &self.data[self.layer3_offset..self.payload_offset]
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..])
    }

    /// Replaces the payload and updates the total length field. The checksum is left alone.
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);

        let total_len = (self.header_len() + payload.len()) as u16;
        self.data[self.layer3_offset + 2..=self.layer3_offset + 3]
            .copy_from_slice(&total_len.to_be_bytes());

        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[self.layer3_offset + 9])
    }

    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 2..=self.layer3_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    pub fn ttl(&self) -> u8 {
        self.data[self.layer3_offset + 8]
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.data[self.layer3_offset + 8] = ttl;
    }

    pub fn identification(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 4..=self.layer3_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    pub fn fragment_offset(&self) -> u16 {
        u16::from_be_bytes([
            self.data[self.layer3_offset + 6] & 0x1F,
            self.data[self.layer3_offset + 7],
        ])
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 10..=self.layer3_offset + 11]
                .try_into()
                .unwrap(),
        )
    }

    /// Checksum the header should carry, computed as if the checksum field were zero
    pub fn calculate_checksum(&self) -> u16 {
        let mut header = self.header().to_vec();
        header[10] = 0;
        header[11] = 0;
        internet_checksum(&header)
    }

    /// True when the received checksum matches a recomputation over the header
    pub fn validate_checksum(&self) -> bool {
        self.checksum() == self.calculate_checksum()
    }

    /// Sets checksum field to valid value
    pub fn set_checksum(&mut self) {
        let new_checksum = self.calculate_checksum();
        self.data[self.layer3_offset + 10..=self.layer3_offset + 11]
            .copy_from_slice(&new_checksum.to_be_bytes());
    }
}

/// Ipv4Packets are considered the same if they have the same data from the layer 3
/// header and onward.
impl PartialEq for Ipv4Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer3_offset..] == other.data[other.layer3_offset..]
    }
}

impl Eq for Ipv4Packet {}

/// Reads the protocol field without building a full packet view.
pub fn get_ipv4_payload_type(
    data: &[u8],
    layer3_offset: usize,
) -> Result<IpProtocol, &'static str> {
    if data.len() <= layer3_offset + 9 || (data[layer3_offset] & 0xF0) != 0x40 {
        return Err("Is not an Ipv4 packet");
    }
    Ok(IpProtocol::from(data[layer3_offset + 9]))
}

impl TryFrom<EthernetFrame> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != IPV4_ETHER_TYPE {
            return Err("Frame does not have IPv4 ether type");
        }
        let layer3_offset = frame.payload_offset;
        Ipv4Packet::new(frame.data, Some(0), layer3_offset)
    }
}

impl TryFrom<UdpSegment> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(segment: UdpSegment) -> Result<Self, Self::Error> {
        if let Some(layer3_offset) = segment.layer3_offset {
            Ipv4Packet::new(segment.data, segment.layer2_offset, layer3_offset)
        } else {
            Err("UDP Segment does not contain an IP Packet")
        }
    }
}

impl TryFrom<IcmpMessage> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(message: IcmpMessage) -> Result<Self, Self::Error> {
        if let Some(layer3_offset) = message.layer3_offset {
            Ipv4Packet::new(message.data, message.layer2_offset, layer3_offset)
        } else {
            Err("ICMP Message does not contain an IP Packet")
        }
    }
}
