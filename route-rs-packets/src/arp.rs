use crate::{EthernetFrame, MacAddr, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

impl ArpOp {
    pub fn from_u16(opcode: u16) -> Option<ArpOp> {
        match opcode {
            1 => Some(ArpOp::Request),
            2 => Some(ArpOp::Reply),
            _ => None,
        }
    }
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_RANGE: (usize, usize) = (4, 5);
const PROTOCOL_ADDR_LEN_RANGE: (usize, usize) = (5, 6);
const OPCODE_RANGE: (usize, usize) = (6, 8);

///
/// EthernetFrame wrapper with getters/setters for the packet structure described in RFC 826
/// https://tools.ietf.org/html/rfc826
///
#[derive(Clone, Debug)]
pub struct ArpFrame {
    frame: EthernetFrame,
}

impl ArpFrame {
    ///
    /// Constructs a new, empty packet with a payload big enough for all ARP fields,
    /// given some hardware/protocol address lengths.
    ///
    pub fn new(hardware_addr_len: u8, protocol_addr_len: u8) -> Self {
        let payload_len = 8 + (2 * hardware_addr_len as usize) + (2 * protocol_addr_len as usize);

        let mut frame = EthernetFrame::empty();
        frame.set_ether_type(ARP_ETHER_TYPE);
        frame.set_payload(&vec![0; payload_len]);

        let mut arp_frame = ArpFrame { frame };
        arp_frame.set_hardware_addr_len(hardware_addr_len);
        arp_frame.set_protocol_addr_len(protocol_addr_len);
        arp_frame
    }

    /// Ethernet/IPv4 request broadcast from `sender`, asking who has `target_ip`.
    /// The target hardware address is left zero-filled.
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        let mut arp_frame = ArpFrame::ethernet_ipv4(ArpOp::Request);
        arp_frame.frame.set_dest_mac(MacAddr::BROADCAST);
        arp_frame.frame.set_src_mac(sender_mac);
        arp_frame.set_sender_hardware_addr(sender_mac);
        arp_frame.set_sender_ipv4_addr(sender_ip);
        arp_frame.set_target_ipv4_addr(target_ip);
        arp_frame
    }

    /// Reply to `request` on behalf of `(mac, ip)`, unicast back to the requester.
    /// `None` unless the request is Ethernet/IPv4.
    pub fn reply_to(request: &ArpFrame, mac: MacAddr, ip: Ipv4Addr) -> Option<Self> {
        if !request.is_ethernet_ipv4() {
            return None;
        }
        let requester_mac = request.sender_mac_addr()?;
        let requester_ip = request.sender_ipv4_addr()?;

        let mut arp_frame = ArpFrame::ethernet_ipv4(ArpOp::Reply);
        arp_frame.frame.set_dest_mac(request.frame.src_mac());
        arp_frame.frame.set_src_mac(mac);
        arp_frame.set_sender_hardware_addr(mac);
        arp_frame.set_sender_ipv4_addr(ip);
        arp_frame.set_target_hardware_addr(requester_mac);
        arp_frame.set_target_ipv4_addr(requester_ip);
        Some(arp_frame)
    }

    fn ethernet_ipv4(op: ArpOp) -> Self {
        let mut arp_frame = ArpFrame::new(6, 4);
        arp_frame.set_hardware_type(ArpHardwareType::Ethernet as u16);
        arp_frame.set_protocol_type(IPV4_ETHER_TYPE);
        arp_frame.set_opcode(op as u16);
        arp_frame
    }

    /// Hardware type Ethernet, protocol IPv4, with 6 and 4 byte addresses
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hardware_type() == ArpHardwareType::Ethernet as u16
            && self.protocol_type() == IPV4_ETHER_TYPE
            && self.hardware_addr_len() == 6
            && self.protocol_addr_len() == 4
    }

    pub fn hardware_type(&self) -> u16 {
        let (start, end) = HARDWARE_TYPE_RANGE;
        u16::from_be_bytes(self.arp_data(start, end).try_into().unwrap())
    }

    pub fn protocol_type(&self) -> u16 {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        u16::from_be_bytes(self.arp_data(start, end).try_into().unwrap())
    }

    pub fn hardware_addr_len(&self) -> u8 {
        self.arp_data(HARDWARE_ADDR_LEN_RANGE.0, HARDWARE_ADDR_LEN_RANGE.1)[0]
    }

    pub fn protocol_addr_len(&self) -> u8 {
        self.arp_data(PROTOCOL_ADDR_LEN_RANGE.0, PROTOCOL_ADDR_LEN_RANGE.1)[0]
    }

    pub fn opcode(&self) -> u16 {
        let (start, end) = OPCODE_RANGE;
        u16::from_be_bytes(self.arp_data(start, end).try_into().unwrap())
    }

    pub fn op(&self) -> Option<ArpOp> {
        ArpOp::from_u16(self.opcode())
    }

    pub fn sender_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.sender_hardware_addr_range();
        self.arp_data(start, end)
    }

    pub fn sender_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.sender_protocol_addr_range();
        self.arp_data(start, end)
    }

    pub fn target_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.target_hardware_addr_range();
        self.arp_data(start, end)
    }

    pub fn target_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.target_protocol_addr_range();
        self.arp_data(start, end)
    }

    /// Typed accessors, `None` unless the frame is Ethernet/IPv4 sized
    pub fn sender_mac_addr(&self) -> Option<MacAddr> {
        MacAddr::try_from(self.sender_hardware_addr()).ok()
    }

    pub fn sender_ipv4_addr(&self) -> Option<Ipv4Addr> {
        ipv4_from(self.sender_protocol_addr())
    }

    pub fn target_mac_addr(&self) -> Option<MacAddr> {
        MacAddr::try_from(self.target_hardware_addr()).ok()
    }

    pub fn target_ipv4_addr(&self) -> Option<Ipv4Addr> {
        ipv4_from(self.target_protocol_addr())
    }

    pub fn set_hardware_type(&mut self, htype: u16) {
        let (start, end) = HARDWARE_TYPE_RANGE;
        self.set_arp_data(&htype.to_be_bytes(), start, end);
    }

    pub fn set_protocol_type(&mut self, ptype: u16) {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        self.set_arp_data(&ptype.to_be_bytes(), start, end);
    }

    fn set_hardware_addr_len(&mut self, len: u8) {
        let (start, end) = HARDWARE_ADDR_LEN_RANGE;
        self.set_arp_data(&[len], start, end);
    }

    fn set_protocol_addr_len(&mut self, len: u8) {
        let (start, end) = PROTOCOL_ADDR_LEN_RANGE;
        self.set_arp_data(&[len], start, end);
    }

    pub fn set_opcode(&mut self, code: u16) {
        let (start, end) = OPCODE_RANGE;
        self.set_arp_data(&code.to_be_bytes(), start, end);
    }

    pub fn set_sender_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.sender_hardware_addr_range();
        self.set_arp_data(&addr.bytes, start, end);
    }

    pub fn set_sender_ipv4_addr(&mut self, addr: Ipv4Addr) {
        let (start, end) = self.sender_protocol_addr_range();
        self.set_arp_data(&addr.octets(), start, end);
    }

    pub fn set_target_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.target_hardware_addr_range();
        self.set_arp_data(&addr.bytes, start, end);
    }

    pub fn set_target_ipv4_addr(&mut self, addr: Ipv4Addr) {
        let (start, end) = self.target_protocol_addr_range();
        self.set_arp_data(&addr.octets(), start, end);
    }

    pub fn frame_ref(&self) -> &EthernetFrame {
        &self.frame
    }

    // Move ownership of the frame back to the caller
    pub fn frame(self) -> EthernetFrame {
        self.frame
    }

    // Returns the bytes in the ethernet frame between start and end, exclusive
    fn arp_data(&self, start: usize, end: usize) -> &[u8] {
        let offset = self.frame.payload_offset;
        &self.frame.data[offset + start..offset + end]
    }

    // Panics if `bytes` does not exactly fill the range, so mismatched address lengths are caught
    fn set_arp_data(&mut self, bytes: &[u8], start: usize, end: usize) {
        let offset = self.frame.payload_offset;
        self.frame.data[offset + start..offset + end].copy_from_slice(bytes);
    }

    fn sender_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        (8, 8 + hlen)
    }

    fn sender_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;
        (8 + hlen, 8 + hlen + plen)
    }

    fn target_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;
        (8 + hlen + plen, 8 + (2 * hlen) + plen)
    }

    fn target_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;
        (8 + (2 * hlen) + plen, 8 + (2 * hlen) + (2 * plen))
    }
}

fn ipv4_from(bytes: &[u8]) -> Option<Ipv4Addr> {
    <[u8; 4]>::try_from(bytes).ok().map(Ipv4Addr::from)
}

impl TryFrom<EthernetFrame> for ArpFrame {
    type Error = &'static str;

    ///
    /// Decorates the given EthernetFrame with ArpFrame getters/setters.
    /// Validates
    /// - The frame has an ARP ether type
    /// - The frame has a reasonable payload size given the hardware/protocol address lengths
    ///
    fn try_from(mut frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != ARP_ETHER_TYPE {
            return Err("Frame does not have ARP ether type.");
        };

        let payload = frame.payload();
        if payload.len() < 8 {
            return Err("Frame payload is too small");
        }

        let hlen = payload[4] as usize;
        let plen = payload[5] as usize;
        let arp_len = 8 + (2 * hlen) + (2 * plen);
        if payload.len() < arp_len {
            return Err("Frame payload doesn't match address length fields");
        }

        // Drop Ethernet trailer padding
        let frame_len = frame.payload_offset + arp_len;
        frame.data.truncate(frame_len);

        Ok(ArpFrame { frame })
    }
}
