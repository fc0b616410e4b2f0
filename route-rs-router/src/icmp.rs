use route_rs_packets::{
    IcmpMessage, IpProtocol, Ipv4Packet, ICMP_DEST_UNREACHABLE, ICMP_ECHO_REPLY,
    ICMP_ECHO_REQUEST, ICMP_TIME_EXCEEDED,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

/// TTL of every packet the router originates
pub const GENERATED_TTL: u8 = 64;

/// Bytes of the offending datagram's payload quoted after its header
const QUOTED_PAYLOAD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IcmpKind {
    TimeExceeded,
    NetUnreachable,
    HostUnreachable,
    PortUnreachable,
    EchoReply,
}

impl IcmpKind {
    pub fn type_code(self) -> (u8, u8) {
        match self {
            IcmpKind::TimeExceeded => (ICMP_TIME_EXCEEDED, 0),
            IcmpKind::NetUnreachable => (ICMP_DEST_UNREACHABLE, 0),
            IcmpKind::HostUnreachable => (ICMP_DEST_UNREACHABLE, 1),
            IcmpKind::PortUnreachable => (ICMP_DEST_UNREACHABLE, 3),
            IcmpKind::EchoReply => (ICMP_ECHO_REPLY, 0),
        }
    }

    pub fn is_error(self) -> bool {
        self != IcmpKind::EchoReply
    }
}

/// Builds the IPv4 packet carrying an ICMP message about `original`, addressed back to
/// `original`'s source. Returns `None` when no message should be sent for this packet.
///
/// # Arguments
///
/// * `kind` - Which message to build
/// * `original` - The packet that triggered it. For an echo reply, the echo request.
/// * `src` - Source address of the generated packet
pub fn build(kind: IcmpKind, original: &Ipv4Packet, src: Ipv4Addr) -> Option<Ipv4Packet> {
    let (msg_type, code) = kind.type_code();
    let mut message = IcmpMessage::new(msg_type, code);

    if kind.is_error() {
        if !should_generate_error(original) {
            return None;
        }
        let quoted = original.payload();
        let quoted = &quoted[..quoted.len().min(QUOTED_PAYLOAD_LEN)];
        let mut body = Vec::with_capacity(4 + original.header_len() + quoted.len());
        body.extend(&[0; 4]);
        body.extend(original.header());
        body.extend(quoted);
        message.set_body(&body);
    } else {
        let request = IcmpMessage::try_from(original.clone()).ok()?;
        if request.msg_type() != ICMP_ECHO_REQUEST {
            return None;
        }
        message.set_body(&request.body());
    }
    message.set_checksum();

    Some(Ipv4Packet::encap_icmp(
        src,
        original.src_addr(),
        GENERATED_TTL,
        &message,
    ))
}

// Checks based on RFC 1812 4.3.2.7 (When Not to Send ICMP Errors)
fn should_generate_error(packet: &Ipv4Packet) -> bool {
    // Only the first fragment
    if packet.fragment_offset() != 0 {
        return false;
    }
    // No errors about errors
    if packet.protocol() == IpProtocol::ICMP {
        match IcmpMessage::try_from(packet.clone()) {
            Ok(message) if !message.is_error() => {}
            _ => return false,
        }
    }
    let src = packet.src_addr();
    !(src.is_unspecified() || src.is_broadcast() || src.is_multicast() || src.is_loopback())
}
