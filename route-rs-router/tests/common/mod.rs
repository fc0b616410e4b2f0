#![allow(dead_code)]

use route_rs_packets::{ArpFrame, EthernetFrame, IpProtocol, Ipv4Packet, MacAddr};
use route_rs_router::{
    ChannelPeer, ChannelTransport, Interface, InterfaceTable, ManualClock, RouteEntry, RouteTable,
    Router,
};
use std::net::Ipv4Addr;
use std::sync::Arc;

pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

pub fn mac(last: u8) -> MacAddr {
    MacAddr::new([0x02, 0, 0, 0, 0, last])
}

pub fn iface(name: &str, mac_byte: u8, addr: &str, mask: &str) -> Interface {
    Interface::new(name, mac(mac_byte), ip(addr), ip(mask))
}

pub struct TestRouter {
    pub router: Arc<Router>,
    pub peer: ChannelPeer,
    pub clock: Arc<ManualClock>,
}

pub fn build_router(interfaces: Vec<Interface>, routes: Vec<RouteEntry>) -> TestRouter {
    let interfaces: InterfaceTable = interfaces.into_iter().collect();
    let table = RouteTable::new();
    table.replace(routes);
    let (transport, peer) = ChannelTransport::pair();
    let clock = Arc::new(ManualClock::new());
    let router = Router::new(interfaces, table, Arc::new(transport), clock.clone()).unwrap();
    TestRouter {
        router: Arc::new(router),
        peer,
        clock,
    }
}

/// Two ports, eth0 10.0.0.1/24 and eth1 10.0.1.1/24, default route via 10.0.1.254 on eth1
pub fn edge_router() -> TestRouter {
    build_router(
        vec![
            iface("eth0", 0x01, "10.0.0.1", "255.255.255.0"),
            iface("eth1", 0x02, "10.0.1.1", "255.255.255.0"),
        ],
        vec![
            RouteEntry::fixed(ip("10.0.0.0"), ip("255.255.255.0"), ip("0.0.0.0"), "eth0"),
            RouteEntry::fixed(ip("0.0.0.0"), ip("0.0.0.0"), ip("10.0.1.254"), "eth1"),
        ],
    )
}

pub fn ipv4_frame(
    src_mac: MacAddr,
    dest_mac: MacAddr,
    src: &str,
    dest: &str,
    protocol: IpProtocol,
    ttl: u8,
    payload: &[u8],
) -> EthernetFrame {
    let mut packet = Ipv4Packet::new_header(ip(src), ip(dest), protocol, ttl);
    packet.set_payload(payload);
    packet.set_checksum();
    let mut frame = EthernetFrame::encap_ipv4(packet);
    frame.set_src_mac(src_mac);
    frame.set_dest_mac(dest_mac);
    frame
}

/// An ARP reply from `(sender_mac, sender_ip)` to the router port `(target_mac, target_ip)`
pub fn arp_reply(sender_mac: MacAddr, sender_ip: &str, target_mac: MacAddr, target_ip: &str) -> EthernetFrame {
    let request = ArpFrame::request(target_mac, ip(target_ip), ip(sender_ip));
    ArpFrame::reply_to(&request, sender_mac, ip(sender_ip))
        .unwrap()
        .frame()
}

/// Hands every frame `from` sent out of `from_iface` to `to` as arriving on `to_iface`.
/// Frames sent out of other interfaces are discarded.
pub fn deliver(from: &TestRouter, from_iface: &str, to: &TestRouter, to_iface: &str) -> usize {
    let frames: Vec<EthernetFrame> = from
        .peer
        .drain_sent()
        .into_iter()
        .filter(|(iface, _)| iface == from_iface)
        .map(|(_, frame)| frame)
        .collect();
    let count = frames.len();
    for frame in frames {
        to.router.handle_frame(to_iface, frame);
    }
    count
}
