use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};

pub const ICMP_HEADER_LEN: usize = 8;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_REDIRECT: u8 = 5;
pub const ICMP_ECHO_REQUEST: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;
pub const ICMP_PARAMETER_PROBLEM: u8 = 12;

/// ICMPv4 message (RFC 792): type, code, checksum, a 4 byte rest-of-header word and data.
#[derive(Clone, Debug)]
pub struct IcmpMessage {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
}

impl Packet for IcmpMessage {}

impl IcmpMessage {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: Option<usize>,
        layer4_offset: usize,
    ) -> Result<IcmpMessage, &'static str> {
        if data.len() < layer4_offset + ICMP_HEADER_LEN {
            return Err("Message too short to contain an ICMP header");
        }

        if let Some(layer3_offset) = layer3_offset {
            if get_ipv4_payload_type(&data, layer3_offset)? != IpProtocol::ICMP {
                return Err("Protocol is incorrect, since it isn't ICMP");
            }
        }

        Ok(IcmpMessage {
            data,
            layer2_offset,
            layer3_offset,
            layer4_offset,
        })
    }

    /// Header only message with a zero rest-of-header word and zero checksum.
    pub fn new(msg_type: u8, code: u8) -> IcmpMessage {
        let mut data = vec![0; ICMP_HEADER_LEN];
        data[0] = msg_type;
        data[1] = code;
        IcmpMessage {
            data,
            layer2_offset: None,
            layer3_offset: None,
            layer4_offset: 0,
        }
    }

    pub fn msg_type(&self) -> u8 {
        self.data[self.layer4_offset]
    }

    pub fn code(&self) -> u8 {
        self.data[self.layer4_offset + 1]
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    /// Identifier/sequence for echo, unused (zero) for the error messages
    pub fn rest_of_header(&self) -> [u8; 4] {
        self.data[self.layer4_offset + 4..self.layer4_offset + 8]
            .try_into()
            .unwrap()
    }

    pub fn set_rest_of_header(&mut self, rest: [u8; 4]) {
        self.data[self.layer4_offset + 4..self.layer4_offset + 8].copy_from_slice(&rest);
    }

    /// Everything after the 4 byte type/code/checksum prefix. For an echo this is the
    /// identifier, sequence number and echo data.
    pub fn body(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.layer4_offset + 4..])
    }

    pub fn set_body(&mut self, body: &[u8]) {
        self.data.truncate(self.layer4_offset + 4);
        self.data.reserve_exact(body.len());
        self.data.extend(body);
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.layer4_offset + ICMP_HEADER_LEN..])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[self.layer4_offset..]
    }

    /// Checksum over the serialized message with the checksum field zeroed
    pub fn calculate_checksum(&self) -> u16 {
        let mut bytes = self.as_bytes().to_vec();
        bytes[2] = 0;
        bytes[3] = 0;
        internet_checksum(&bytes)
    }

    pub fn validate_checksum(&self) -> bool {
        self.checksum() == self.calculate_checksum()
    }

    pub fn set_checksum(&mut self) {
        let checksum = self.calculate_checksum();
        self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
            .copy_from_slice(&checksum.to_be_bytes());
    }

    /// Error messages must never trigger further ICMP errors
    pub fn is_error(&self) -> bool {
        match self.msg_type() {
            ICMP_DEST_UNREACHABLE | ICMP_REDIRECT | ICMP_TIME_EXCEEDED
            | ICMP_PARAMETER_PROBLEM => true,
            _ => false,
        }
    }
}

impl PartialEq for IcmpMessage {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for IcmpMessage {}

impl TryFrom<Ipv4Packet> for IcmpMessage {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        IcmpMessage::from_buffer(
            packet.data,
            packet.layer2_offset,
            Some(packet.layer3_offset),
            packet.payload_offset,
        )
    }
}
