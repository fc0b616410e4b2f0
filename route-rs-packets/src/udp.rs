use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};

pub const UDP_HEADER_LEN: usize = 8;

#[derive(Clone, Debug)]
pub struct UdpSegment {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
    pub payload_offset: usize,
}

impl Packet for UdpSegment {}

impl UdpSegment {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: Option<usize>,
        layer4_offset: usize,
    ) -> Result<UdpSegment, &'static str> {
        if data.len() < layer4_offset + UDP_HEADER_LEN {
            return Err("Segment too short to contain a UDP header");
        }

        if let Some(layer3_offset) = layer3_offset {
            if get_ipv4_payload_type(&data, layer3_offset)? != IpProtocol::UDP {
                return Err("Protocol is incorrect, since it isn't UDP");
            }
        }

        let length = u16::from_be_bytes(
            data[layer4_offset + 4..=layer4_offset + 5]
                .try_into()
                .unwrap(),
        ) as usize;
        if length < UDP_HEADER_LEN || data.len() < layer4_offset + length {
            return Err("Segment is not correct length as given by its length field");
        }

        Ok(UdpSegment {
            data,
            layer2_offset,
            layer3_offset,
            layer4_offset,
            payload_offset: layer4_offset + UDP_HEADER_LEN,
        })
    }

    /// Header only segment with the given ports and no layer 3 header.
    pub fn new(src_port: u16, dest_port: u16) -> UdpSegment {
        let mut data = vec![0; UDP_HEADER_LEN];
        data[0..2].copy_from_slice(&src_port.to_be_bytes());
        data[2..4].copy_from_slice(&dest_port.to_be_bytes());
        data[4..6].copy_from_slice(&(UDP_HEADER_LEN as u16).to_be_bytes());
        UdpSegment {
            data,
            layer2_offset: None,
            layer3_offset: None,
            layer4_offset: 0,
            payload_offset: UDP_HEADER_LEN,
        }
    }

    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset..=self.layer4_offset + 1]
                .try_into()
                .unwrap(),
        )
    }

    pub fn dest_port(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    pub fn length(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 4..=self.layer4_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
                .try_into()
                .unwrap(),
        )
    }

    /// Zero means "no checksum" for UDP over IPv4, which is what generated segments carry.
    pub fn set_checksum(&mut self, checksum: u16) -> &mut Self {
        self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
            .copy_from_slice(&checksum.to_be_bytes());
        self
    }

    /// Payload bounded by the length field
    pub fn payload(&self) -> Cow<[u8]> {
        let end = self.layer4_offset + self.length() as usize;
        Cow::from(&self.data[self.payload_offset..end])
    }

    /// Sets the payload and the length field. The enclosing IP packet's total length is not
    /// touched.
    pub fn set_payload(&mut self, payload: &[u8]) -> &mut Self {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
        let length = (UDP_HEADER_LEN + payload.len()) as u16;
        self.data[self.layer4_offset + 4..=self.layer4_offset + 5]
            .copy_from_slice(&length.to_be_bytes());
        self
    }

    /// Segment bytes from the UDP header onward
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[self.layer4_offset..]
    }
}

/// UdpSegments are considered the same if they have the same data from the layer 4
/// header and onward.
impl PartialEq for UdpSegment {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer4_offset..] == other.data[other.layer4_offset..]
    }
}

impl Eq for UdpSegment {}

impl TryFrom<Ipv4Packet> for UdpSegment {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        UdpSegment::from_buffer(
            packet.data,
            packet.layer2_offset,
            Some(packet.layer3_offset),
            packet.payload_offset,
        )
    }
}
