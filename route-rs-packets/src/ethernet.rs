use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};

/// An Ethernet II frame. The layer 2 header always starts at the front of `data`.
#[derive(Clone, Debug)]
pub struct EthernetFrame {
    pub data: PacketData,
    pub payload_offset: usize,
}

impl Packet for EthernetFrame {}

impl EthernetFrame {
    pub fn from_buffer(frame: PacketData) -> Result<EthernetFrame, &'static str> {
        // 0                    6                    12                      14
        // |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
        if frame.len() < 14 {
            return Err("Frame is less than the minimum of 14 bytes");
        }

        Ok(EthernetFrame {
            data: frame,
            payload_offset: 14,
        })
    }

    /// Returns a frame with a zeroed 14 byte header and no payload.
    pub fn empty() -> EthernetFrame {
        EthernetFrame {
            data: vec![0; 14],
            payload_offset: 14,
        }
    }

    pub fn dest_mac(&self) -> MacAddr {
        MacAddr::new(self.data[0..6].try_into().unwrap())
    }

    pub fn src_mac(&self) -> MacAddr {
        MacAddr::new(self.data[6..12].try_into().unwrap())
    }

    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        self.data[..6].copy_from_slice(&mac.bytes);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        self.data[6..12].copy_from_slice(&mac.bytes);
    }

    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.data[12..=13].try_into().unwrap())
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        self.data[12..=13].copy_from_slice(&ether_type.to_be_bytes());
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..])
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    /// Wire bytes of the whole frame
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn encap_ipv4(ipv4: Ipv4Packet) -> EthernetFrame {
        let mut frame = EthernetFrame::empty();
        frame.set_payload(&ipv4.data[ipv4.layer3_offset..]);
        frame.set_ether_type(IPV4_ETHER_TYPE);
        frame
    }
}

/// Frames are equal when their wire bytes are equal
impl PartialEq for EthernetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for EthernetFrame {}

impl TryFrom<UdpSegment> for EthernetFrame {
    type Error = &'static str;

    fn try_from(segment: UdpSegment) -> Result<Self, Self::Error> {
        match segment.layer2_offset {
            Some(0) => EthernetFrame::from_buffer(segment.data),
            _ => Err("UDP Segment does not contain an Ethernet Frame"),
        }
    }
}

impl TryFrom<Ipv4Packet> for EthernetFrame {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        match packet.layer2_offset {
            Some(0) => EthernetFrame::from_buffer(packet.data),
            _ => Err("IPv4 Packet does not contain an Ethernet Frame"),
        }
    }
}

impl TryFrom<IcmpMessage> for EthernetFrame {
    type Error = &'static str;

    fn try_from(message: IcmpMessage) -> Result<Self, Self::Error> {
        match message.layer2_offset {
            Some(0) => EthernetFrame::from_buffer(message.data),
            _ => Err("ICMP Message does not contain an Ethernet Frame"),
        }
    }
}
