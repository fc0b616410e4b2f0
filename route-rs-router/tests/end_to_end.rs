mod common;

use common::*;
use route_rs_packets::{
    ArpFrame, ArpOp, IcmpMessage, IpProtocol, Ipv4Packet, MacAddr, ICMP_DEST_UNREACHABLE,
    RIP_INFINITY,
};
use route_rs_router::{RipState, Router};
use std::convert::TryFrom;
use std::thread;
use std::time::Duration;

const HOST_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0, 0x10],
};
const GATEWAY_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0, 0xfe],
};

#[test]
fn forwards_once_next_hop_resolves() {
    let test = edge_router();
    let router = &test.router;

    let frame = ipv4_frame(HOST_MAC, mac(0x01), "10.0.0.2", "8.8.8.8", IpProtocol::UDP, 64, &[9; 12]);
    router.handle_frame("eth0", frame);

    // The packet waits on ARP for the default gateway
    let sent = test.peer.drain_sent();
    assert_eq!(sent.len(), 1);
    let (iface, request) = &sent[0];
    assert_eq!(iface, "eth1");
    assert!(request.dest_mac().is_broadcast());
    let request = ArpFrame::try_from(request.clone()).unwrap();
    assert_eq!(request.op(), Some(ArpOp::Request));
    assert_eq!(request.sender_ipv4_addr(), Some(ip("10.0.1.1")));
    assert_eq!(request.target_ipv4_addr(), Some(ip("10.0.1.254")));
    assert_eq!(router.arp().pending(), 1);

    router.handle_frame("eth1", arp_reply(GATEWAY_MAC, "10.0.1.254", mac(0x02), "10.0.1.1"));

    let sent = test.peer.drain_sent();
    assert_eq!(sent.len(), 1);
    let (iface, forwarded) = &sent[0];
    assert_eq!(iface, "eth1");
    assert_eq!(forwarded.dest_mac(), GATEWAY_MAC);
    assert_eq!(forwarded.src_mac(), mac(0x02));
    let packet = Ipv4Packet::try_from(forwarded.clone()).unwrap();
    assert_eq!(packet.ttl(), 63);
    assert!(packet.validate_checksum());
    assert_eq!(packet.dest_addr(), ip("8.8.8.8"));
    assert_eq!(router.arp().pending(), 0);

    // Now resolved, the next packet goes straight out
    let frame = ipv4_frame(HOST_MAC, mac(0x01), "10.0.0.2", "8.8.4.4", IpProtocol::UDP, 64, &[1; 4]);
    router.handle_frame("eth0", frame);
    let sent = test.peer.drain_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.dest_mac(), GATEWAY_MAC);
}

#[test]
fn unanswered_arp_yields_host_unreachable() {
    let test = edge_router();
    let router = &test.router;
    router.handle_frame("eth0", arp_reply(HOST_MAC, "10.0.0.2", mac(0x01), "10.0.0.1"));

    for n in 0..3u8 {
        let frame = ipv4_frame(HOST_MAC, mac(0x01), "10.0.0.2", "8.8.8.8", IpProtocol::UDP, 64, &[n; 8]);
        router.handle_frame("eth0", frame);
    }

    let mut probes = test.peer.drain_sent().len();
    for _ in 0..4 {
        test.clock.advance_millis(1000);
        router.arp_tick();
        probes += test.peer.drain_sent().len();
    }
    assert_eq!(probes, 5);

    test.clock.advance_millis(1000);
    router.arp_tick();
    let sent = test.peer.drain_sent();
    assert_eq!(sent.len(), 3);
    for (iface, frame) in &sent {
        assert_eq!(iface, "eth0");
        assert_eq!(frame.dest_mac(), HOST_MAC);
        let packet = Ipv4Packet::try_from(frame.clone()).unwrap();
        assert_eq!(packet.dest_addr(), ip("10.0.0.2"));
        assert_eq!(packet.src_addr(), ip("10.0.0.1"));
        let message = IcmpMessage::try_from(packet).unwrap();
        assert_eq!((message.msg_type(), message.code()), (ICMP_DEST_UNREACHABLE, 1));
    }
    assert_eq!(router.arp().pending(), 0);

    // Nothing left to retry
    test.clock.advance_millis(1000);
    router.arp_tick();
    assert!(test.peer.drain_sent().is_empty());
}

#[test]
fn stale_arp_entries_are_re_resolved() {
    let test = edge_router();
    let router = &test.router;
    router.handle_frame("eth1", arp_reply(GATEWAY_MAC, "10.0.1.254", mac(0x02), "10.0.1.1"));
    assert_eq!(router.arp().lookup(ip("10.0.1.254")), Some(GATEWAY_MAC));

    test.clock.advance_millis(15_001);
    router.arp_tick();
    assert_eq!(router.arp().lookup(ip("10.0.1.254")), None);

    let frame = ipv4_frame(HOST_MAC, mac(0x01), "10.0.0.2", "8.8.8.8", IpProtocol::UDP, 64, &[0; 8]);
    router.handle_frame("eth0", frame);
    let sent = test.peer.drain_sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.dest_mac().is_broadcast());
}

fn rip_pair() -> (TestRouter, TestRouter) {
    let a = build_router(
        vec![
            iface("eth0", 0x01, "10.0.0.1", "255.255.255.0"),
            iface("eth1", 0x02, "10.0.1.1", "255.255.255.0"),
        ],
        vec![],
    );
    let b = build_router(
        vec![
            iface("eth0", 0x11, "10.0.1.2", "255.255.255.0"),
            iface("eth1", 0x12, "10.0.2.1", "255.255.255.0"),
        ],
        vec![],
    );
    (a, b)
}

#[test]
fn rip_neighbours_learn_each_other() {
    let (a, b) = rip_pair();
    a.router.init();
    b.router.init();
    assert_eq!(a.router.rip().state(), RipState::Running);

    // Each bootstrap request reaches the other side, which answers by unicast
    deliver(&a, "eth1", &b, "eth0");
    deliver(&b, "eth0", &a, "eth1");
    assert_eq!(deliver(&b, "eth0", &a, "eth1"), 0);
    deliver(&a, "eth1", &b, "eth0");

    let learned = a
        .router
        .routes()
        .find_entry(ip("10.0.2.0"), ip("255.255.255.0"))
        .unwrap();
    assert_eq!(learned.metric, 1);
    assert_eq!(learned.gateway, ip("10.0.1.2"));
    assert_eq!(learned.interface, "eth1");

    let learned = b
        .router
        .routes()
        .find_entry(ip("10.0.0.0"), ip("255.255.255.0"))
        .unwrap();
    assert_eq!(learned.metric, 1);
    assert_eq!(learned.gateway, ip("10.0.1.1"));

    // The shared subnet stays connected on both sides
    let shared = a
        .router
        .routes()
        .find_entry(ip("10.0.1.0"), ip("255.255.255.0"))
        .unwrap();
    assert_eq!(shared.metric, 0);
    assert!(!shared.is_learned());
}

#[test]
fn silent_neighbour_routes_age_out() {
    let (a, b) = rip_pair();
    a.router.init();
    b.router.init();
    a.peer.drain_sent();
    b.router.rip_tick();
    deliver(&b, "eth0", &a, "eth1");
    assert_eq!(a.router.routes().len(), 3);

    a.clock.advance_millis(10_000);
    a.router.rip_tick();
    assert_eq!(a.router.routes().len(), 3);
    a.clock.advance_millis(20_001);
    a.router.rip_tick();
    assert_eq!(a.router.routes().len(), 2);
    assert!(a
        .router
        .routes()
        .longest_prefix_match(ip("10.0.2.7"))
        .is_none());
}

#[test]
fn unreachable_advertisements_are_not_used() {
    let (a, b) = rip_pair();
    a.router.init();
    b.router.init();
    a.peer.drain_sent();
    b.router
        .routes()
        .update_entry(ip("10.0.2.0"), ip("255.255.255.0"), ip("0.0.0.0"), "eth1", Some(RIP_INFINITY));
    b.router.rip_tick();
    deliver(&b, "eth0", &a, "eth1");

    let entry = a
        .router
        .routes()
        .find_entry(ip("10.0.2.0"), ip("255.255.255.0"))
        .unwrap();
    assert_eq!(entry.metric, RIP_INFINITY);
    assert!(a
        .router
        .routes()
        .longest_prefix_match(ip("10.0.2.7"))
        .is_none());
}

#[test]
fn running_router_serves_until_stopped() {
    let test = edge_router();
    let running = Router::start(test.router.clone()).unwrap();
    let server = thread::spawn(move || running.serve());

    let request = ArpFrame::request(HOST_MAC, ip("10.0.0.2"), ip("10.0.0.1"));
    test.peer.inject("eth0", request.frame());
    let (iface, reply) = test.peer.next_sent(Duration::from_secs(5)).unwrap();
    assert_eq!(iface, "eth0");
    assert_eq!(reply.dest_mac(), HOST_MAC);

    test.router.stop();
    server.join().unwrap();
}

#[test]
fn shutdown_without_serving() {
    let test = edge_router();
    let running = Router::start(test.router.clone()).unwrap();
    running.shutdown();
    test.peer.inject("eth0", ArpFrame::request(HOST_MAC, ip("10.0.0.2"), ip("10.0.0.1")).frame());
    assert!(test.peer.drain_sent().is_empty());
}
