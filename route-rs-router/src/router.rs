use crate::arp::{ArpCache, RequestUpdate, ARP_TICK_INTERVAL};
use crate::clock::Clock;
use crate::error::Result;
use crate::icmp::{self, IcmpKind};
use crate::interface::{Interface, InterfaceTable};
use crate::rip::{Outbound, RipEngine, RIP_UPDATE_INTERVAL};
use crate::route::RouteTable;
use crate::timer::PeriodicTask;
use crate::transport::Transport;
use route_rs_packets::{
    ArpFrame, ArpOp, EthernetFrame, IcmpMessage, IpProtocol, Ipv4Packet, MacAddr, UdpSegment,
    ARP_ETHER_TYPE, ICMP_ECHO_REQUEST, IPV4_ETHER_TYPE, RIP_MULTICAST_ADDR, RIP_PORT,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an Ethernet frame carries
enum LinkPayload {
    Arp(ArpFrame),
    Ipv4(Ipv4Packet),
}

impl TryFrom<EthernetFrame> for LinkPayload {
    type Error = &'static str;

    fn try_from(frame: EthernetFrame) -> std::result::Result<Self, Self::Error> {
        match frame.ether_type() {
            ARP_ETHER_TYPE => ArpFrame::try_from(frame).map(LinkPayload::Arp),
            IPV4_ETHER_TYPE => Ipv4Packet::try_from(frame).map(LinkPayload::Ipv4),
            _ => Err("Unsupported ether type"),
        }
    }
}

/// What a datagram addressed to the router itself carries
enum LocalPayload {
    Transport,
    Icmp(IcmpMessage),
    Other(IpProtocol),
}

impl TryFrom<&Ipv4Packet> for LocalPayload {
    type Error = &'static str;

    fn try_from(packet: &Ipv4Packet) -> std::result::Result<Self, Self::Error> {
        match packet.protocol() {
            IpProtocol::TCP | IpProtocol::UDP => Ok(LocalPayload::Transport),
            IpProtocol::ICMP => IcmpMessage::try_from(packet.clone()).map(LocalPayload::Icmp),
            other => Ok(LocalPayload::Other(other)),
        }
    }
}

/// The data plane: interface identities, the route table, ARP and RIP state, wired to a
/// transport. Shared between the reception thread and the timer threads through an `Arc`.
pub struct Router {
    interfaces: InterfaceTable,
    routes: RouteTable,
    arp: ArpCache,
    rip: RipEngine,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl Router {
    /// Fails if a route egresses through an interface the router does not have
    pub fn new(
        interfaces: InterfaceTable,
        routes: RouteTable,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Router> {
        routes.verify(&interfaces)?;
        Ok(Router {
            interfaces,
            routes,
            arp: ArpCache::new(),
            rip: RipEngine::new(),
            transport,
            clock,
        })
    }

    pub fn interfaces(&self) -> &InterfaceTable {
        &self.interfaces
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn arp(&self) -> &ArpCache {
        &self.arp
    }

    pub fn rip(&self) -> &RipEngine {
        &self.rip
    }

    /// Brings up dynamic routing unless static routes were loaded
    pub fn init(&self) {
        let requests = self.rip.bootstrap(&self.interfaces, &self.routes);
        self.send_all(requests);
        if self.rip.mark_running() {
            info!("RIP running");
        }
        info!("Routing table:\n{}", self.routes);
    }

    /// Spawns the ARP timer, and the RIP timer when RIP is running
    pub fn start(router: Arc<Router>) -> Result<RunningRouter> {
        let mut running = RunningRouter {
            router: Arc::clone(&router),
            timers: vec![],
        };

        let arp_router = Arc::clone(&router);
        running.timers.push(PeriodicTask::spawn(
            "arp-timer",
            ARP_TICK_INTERVAL,
            move || arp_router.arp_tick(),
        )?);

        if router.rip.is_running() {
            let rip_router = Arc::clone(&router);
            running.timers.push(PeriodicTask::spawn(
                "rip-timer",
                RIP_UPDATE_INTERVAL,
                move || rip_router.rip_tick(),
            )?);
        }
        Ok(running)
    }

    /// Ends the transport session, which lets `RunningRouter::serve` return
    pub fn stop(&self) {
        self.transport.close();
    }

    /// Runs one received frame through the pipeline. Never blocks on address resolution.
    pub fn handle_frame(&self, iface: &str, frame: EthernetFrame) {
        let iface = match self.interfaces.get(iface) {
            Some(iface) => iface,
            None => {
                debug!("Dropping frame from unknown interface {}", iface);
                return;
            }
        };
        let src_mac = frame.src_mac();

        match LinkPayload::try_from(frame) {
            Ok(LinkPayload::Arp(arp)) => self.handle_arp(iface, arp),
            Ok(LinkPayload::Ipv4(packet)) => self.handle_ipv4(iface, src_mac, packet),
            Err(e) => debug!("{}: dropping frame: {}", iface.name, e),
        }
    }

    /// ARP maintenance, run once a second
    pub fn arp_tick(&self) {
        for update in self.arp.tick(self.clock.now()) {
            self.apply_arp_update(update);
        }
    }

    /// RIP update, run every ten seconds
    pub fn rip_tick(&self) {
        let updates = self
            .rip
            .tick(&self.interfaces, &self.routes, self.clock.now());
        self.send_all(updates);
    }

    fn handle_arp(&self, iface: &Interface, arp: ArpFrame) {
        if !arp.is_ethernet_ipv4() {
            debug!(
                "{}: dropping ARP with hardware type {} protocol {:#06x}",
                iface.name,
                arp.hardware_type(),
                arp.protocol_type()
            );
            return;
        }
        if arp.target_ipv4_addr() != Some(iface.ip) {
            debug!("{}: ARP not for us", iface.name);
            return;
        }

        match arp.op() {
            Some(ArpOp::Request) => {
                if let Some(reply) = ArpFrame::reply_to(&arp, iface.mac, iface.ip) {
                    self.send(&iface.name, reply.frame_ref());
                }
            }
            Some(ArpOp::Reply) => {
                let (mac, ip) = match (arp.sender_mac_addr(), arp.sender_ipv4_addr()) {
                    (Some(mac), Some(ip)) => (mac, ip),
                    _ => return,
                };
                debug!("{}: {} is at {}", iface.name, ip, mac);
                if let Some(request) = self.arp.insert(mac, ip, self.clock.now()) {
                    for mut frame in request.queue {
                        frame.set_dest_mac(mac);
                        self.send(&request.iface, &frame);
                    }
                }
            }
            None => debug!("{}: unknown ARP opcode {}", iface.name, arp.opcode()),
        }
    }

    fn handle_ipv4(&self, iface: &Interface, src_mac: MacAddr, mut packet: Ipv4Packet) {
        if let Some(segment) = self.rip_segment(iface, &packet) {
            if let Some((out_iface, frame)) = self.rip.handle(
                iface,
                src_mac,
                &packet,
                &segment,
                &self.routes,
                self.clock.now(),
            ) {
                self.send(&out_iface, &frame);
            }
            return;
        }

        if !packet.validate_checksum() {
            debug!("{}: bad IPv4 checksum from {}", iface.name, packet.src_addr());
            return;
        }

        if packet.ttl() <= 1 {
            debug!("{}: TTL expired for {}", iface.name, packet.dest_addr());
            self.emit_icmp(IcmpKind::TimeExceeded, &packet);
            return;
        }
        packet.set_ttl(packet.ttl() - 1);
        packet.set_checksum();

        if self.interfaces.owning(packet.dest_addr()).is_some() {
            self.deliver_local(iface, packet);
        } else {
            self.forward(iface, packet);
        }
    }

    /// The UDP segment of `packet` if it is RIP: sent to the RIP group, or to our own address
    /// while RIP is running
    fn rip_segment(&self, iface: &Interface, packet: &Ipv4Packet) -> Option<UdpSegment> {
        if packet.protocol() != IpProtocol::UDP {
            return None;
        }
        let dest = packet.dest_addr();
        if dest != RIP_MULTICAST_ADDR && !(dest == iface.ip && self.rip.is_running()) {
            return None;
        }
        UdpSegment::try_from(packet.clone())
            .ok()
            .filter(|segment| segment.dest_port() == RIP_PORT)
    }

    fn deliver_local(&self, iface: &Interface, packet: Ipv4Packet) {
        match LocalPayload::try_from(&packet) {
            Ok(LocalPayload::Transport) => self.emit_icmp(IcmpKind::PortUnreachable, &packet),
            Ok(LocalPayload::Icmp(message)) if message.msg_type() == ICMP_ECHO_REQUEST => {
                self.emit_icmp(IcmpKind::EchoReply, &packet)
            }
            Ok(LocalPayload::Icmp(message)) => debug!(
                "{}: ignoring ICMP type {} for {}",
                iface.name,
                message.msg_type(),
                packet.dest_addr()
            ),
            Ok(LocalPayload::Other(protocol)) => debug!(
                "{}: no handler for {:?} to {}",
                iface.name,
                protocol,
                packet.dest_addr()
            ),
            Err(e) => debug!("{}: dropping local packet: {}", iface.name, e),
        }
    }

    fn forward(&self, ingress: &Interface, packet: Ipv4Packet) {
        let dest = packet.dest_addr();
        let route = match self.routes.longest_prefix_match(dest) {
            Some(route) => route,
            None => {
                debug!("{}: no route to {}", ingress.name, dest);
                self.emit_icmp(IcmpKind::NetUnreachable, &packet);
                return;
            }
        };
        if route.interface == ingress.name {
            debug!("{}: not forwarding {} back out its ingress", ingress.name, dest);
            return;
        }
        let egress = match self.interfaces.get(&route.interface) {
            Some(egress) => egress,
            None => {
                warn!("Route to {} uses unknown interface {}", dest, route.interface);
                return;
            }
        };

        let mut frame = match EthernetFrame::try_from(packet) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("{}: dropping packet: {}", ingress.name, e);
                return;
            }
        };
        frame.set_src_mac(egress.mac);
        self.transmit_or_queue(frame, egress, route.next_hop(dest));
    }

    /// Sends an ICMP message about `original` back to its source. Suppressed silently when
    /// there is no route back or the message should not be generated at all.
    fn emit_icmp(&self, kind: IcmpKind, original: &Ipv4Packet) {
        let dest = original.src_addr();
        if self.interfaces.owning(dest).is_some() {
            return;
        }
        let route = match self.routes.longest_prefix_match(dest) {
            Some(route) => route,
            None => {
                debug!("No route back to {}, suppressing {:?}", dest, kind);
                return;
            }
        };
        let iface = match self.interfaces.get(&route.interface) {
            Some(iface) => iface,
            None => return,
        };

        let src = match kind {
            IcmpKind::EchoReply => original.dest_addr(),
            _ => iface.ip,
        };
        let packet = match icmp::build(kind, original, src) {
            Some(packet) => packet,
            None => return,
        };
        debug!("{}: sending {:?} to {}", iface.name, kind, dest);

        let mut frame = EthernetFrame::encap_ipv4(packet);
        frame.set_src_mac(iface.mac);
        self.transmit_or_queue(frame, iface, route.next_hop(dest));
    }

    /// Sends right away when the next hop's MAC is known, otherwise parks the frame on ARP
    fn transmit_or_queue(&self, mut frame: EthernetFrame, egress: &Interface, next_hop: Ipv4Addr) {
        if let Some(mac) = self.arp.lookup(next_hop) {
            frame.set_dest_mac(mac);
            self.send(&egress.name, &frame);
            return;
        }
        let update = self
            .arp
            .resolve(frame, &egress.name, next_hop, self.clock.now());
        self.apply_arp_update(update);
    }

    fn apply_arp_update(&self, update: RequestUpdate) {
        match update {
            RequestUpdate::Wait => {}
            RequestUpdate::Probe { target, iface } => match self.interfaces.get(&iface) {
                Some(iface) => {
                    debug!("{}: who has {}", iface.name, target);
                    let request = ArpFrame::request(iface.mac, iface.ip, target);
                    self.send(&iface.name, request.frame_ref());
                }
                None => warn!("ARP request for {} on unknown interface {}", target, iface),
            },
            RequestUpdate::Exhausted(request) => {
                info!(
                    "{}: no ARP reply from {}, dropping {} frames",
                    request.iface,
                    request.ip,
                    request.queue.len()
                );
                for frame in request.queue {
                    if let Ok(packet) = Ipv4Packet::try_from(frame) {
                        self.emit_icmp(IcmpKind::HostUnreachable, &packet);
                    }
                }
            }
        }
    }

    fn send(&self, iface: &str, frame: &EthernetFrame) {
        if !self.transport.send_frame(iface, frame) {
            warn!("{}: failed to send frame", iface);
        }
    }

    fn send_all(&self, frames: Vec<Outbound>) {
        for (iface, frame) in frames {
            self.send(&iface, &frame);
        }
    }
}

/// A started router: the timer tasks plus the router they drive
pub struct RunningRouter {
    router: Arc<Router>,
    timers: Vec<PeriodicTask>,
}

impl RunningRouter {
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Runs the reception loop on this thread until the transport session ends, then stops the
    /// timers
    pub fn serve(self) {
        info!("Router serving");
        while let Some((iface, frame)) = self.router.transport.receive_frame() {
            self.router.handle_frame(&iface, frame);
        }
        info!("Session ended");
        self.stop_timers();
    }

    pub fn shutdown(self) {
        self.router.stop();
        self.stop_timers();
    }

    fn stop_timers(self) {
        for timer in self.timers {
            timer.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::route::RouteEntry;
    use crate::transport::{ChannelPeer, ChannelTransport};
    use route_rs_packets::{
        ArpHardwareType, ICMP_DEST_UNREACHABLE, ICMP_ECHO_REPLY, ICMP_TIME_EXCEEDED,
    };
    use std::time::Instant;

    const ETH0_MAC: MacAddr = MacAddr {
        bytes: [2, 0, 0, 0, 0, 1],
    };
    const HOST_MAC: MacAddr = MacAddr {
        bytes: [2, 0, 0, 0, 0, 0x10],
    };

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn router_with(routes: Vec<RouteEntry>) -> (Router, ChannelPeer) {
        let interfaces = vec![
            Interface::new("eth0", ETH0_MAC, ip("10.0.0.1"), ip("255.255.255.0")),
            Interface::new(
                "eth1",
                MacAddr::new([2, 0, 0, 0, 0, 2]),
                ip("10.0.1.1"),
                ip("255.255.255.0"),
            ),
        ]
        .into_iter()
        .collect();
        let table = RouteTable::new();
        table.replace(routes);
        let (transport, peer) = ChannelTransport::pair();
        let router = Router::new(
            interfaces,
            table,
            Arc::new(transport),
            Arc::new(ManualClock::new()),
        )
        .unwrap();
        (router, peer)
    }

    fn static_router() -> (Router, ChannelPeer) {
        router_with(vec![
            RouteEntry::fixed(ip("10.0.0.0"), ip("255.255.255.0"), ip("0.0.0.0"), "eth0"),
            RouteEntry::fixed(ip("10.0.1.0"), ip("255.255.255.0"), ip("0.0.0.0"), "eth1"),
        ])
    }

    fn ipv4_frame(src: &str, dest: &str, protocol: IpProtocol, ttl: u8, payload: &[u8]) -> EthernetFrame {
        let mut packet = Ipv4Packet::new_header(ip(src), ip(dest), protocol, ttl);
        packet.set_payload(payload);
        packet.set_checksum();
        let mut frame = EthernetFrame::encap_ipv4(packet);
        frame.set_src_mac(HOST_MAC);
        frame.set_dest_mac(ETH0_MAC);
        frame
    }

    fn icmp_in(frame: &EthernetFrame) -> IcmpMessage {
        let packet = Ipv4Packet::try_from(frame.clone()).unwrap();
        IcmpMessage::try_from(packet).unwrap()
    }

    #[test]
    fn unknown_routes_reference_is_rejected() {
        let (transport, _peer) = ChannelTransport::pair();
        let routes = RouteTable::new();
        routes.add_entry(RouteEntry::fixed(ip("0.0.0.0"), ip("0.0.0.0"), ip("10.0.9.1"), "eth9"));
        assert!(Router::new(
            InterfaceTable::new(),
            routes,
            Arc::new(transport),
            Arc::new(ManualClock::new())
        )
        .is_err());
    }

    #[test]
    fn answers_arp_for_own_address_only() {
        let (router, peer) = static_router();
        let request = ArpFrame::request(HOST_MAC, ip("10.0.0.2"), ip("10.0.0.1"));
        router.handle_frame("eth0", request.frame());

        let (iface, reply) = peer.drain_sent().pop().unwrap();
        assert_eq!(iface, "eth0");
        assert_eq!(reply.dest_mac(), HOST_MAC);
        let reply = ArpFrame::try_from(reply).unwrap();
        assert_eq!(reply.op(), Some(ArpOp::Reply));
        assert_eq!(reply.sender_mac_addr(), Some(ETH0_MAC));
        assert_eq!(reply.target_ipv4_addr(), Some(ip("10.0.0.2")));

        let other = ArpFrame::request(HOST_MAC, ip("10.0.0.2"), ip("10.0.0.99"));
        router.handle_frame("eth0", other.frame());
        assert!(peer.drain_sent().is_empty());
    }

    #[test]
    fn corrupted_header_is_dropped_silently() {
        let (router, peer) = static_router();
        let mut frame = ipv4_frame("10.0.0.2", "10.0.1.2", IpProtocol::UDP, 64, &[0; 8]);
        // Flip a bit in the source address without fixing the checksum
        frame.data[14 + 12] ^= 0x01;
        router.handle_frame("eth0", frame);
        assert!(peer.drain_sent().is_empty());
        assert_eq!(router.arp().pending(), 0);
    }

    fn link_frame(ether_type: u16, payload: &[u8]) -> EthernetFrame {
        let mut frame = EthernetFrame::empty();
        frame.set_src_mac(HOST_MAC);
        frame.set_dest_mac(ETH0_MAC);
        frame.set_ether_type(ether_type);
        frame.set_payload(payload);
        frame
    }

    fn assert_dropped(router: &Router, peer: &ChannelPeer, frame: EthernetFrame) {
        router.handle_frame("eth0", frame);
        assert!(peer.drain_sent().is_empty());
        assert_eq!(router.arp().pending(), 0);
    }

    #[test]
    fn truncated_arp_is_dropped() {
        let (router, peer) = static_router();
        assert_dropped(&router, &peer, link_frame(ARP_ETHER_TYPE, &[0, 1, 8, 0, 6, 4]));
    }

    #[test]
    fn arp_with_foreign_address_sizes_is_dropped() {
        let (router, peer) = static_router();
        let mut request = ArpFrame::new(8, 4);
        request.set_hardware_type(ArpHardwareType::Ethernet as u16);
        request.set_protocol_type(IPV4_ETHER_TYPE);
        request.set_opcode(ArpOp::Request as u16);
        request.set_target_ipv4_addr(ip("10.0.0.1"));
        let mut frame = request.frame();
        frame.set_src_mac(HOST_MAC);
        assert_dropped(&router, &peer, frame);
    }

    #[test]
    fn malformed_ipv4_headers_are_dropped() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());

        let mut short_ihl = ipv4_frame("10.0.0.2", "10.0.0.1", IpProtocol::UDP, 64, &[0; 8]);
        short_ihl.data[14] = 0x44;
        assert_dropped(&router, &peer, short_ihl);

        let mut overlong = ipv4_frame("10.0.0.2", "10.0.0.1", IpProtocol::UDP, 64, &[0; 8]);
        overlong.data[14 + 2..14 + 4].copy_from_slice(&200u16.to_be_bytes());
        assert_dropped(&router, &peer, overlong);
    }

    #[test]
    fn unknown_ether_type_is_dropped() {
        let (router, peer) = static_router();
        assert_dropped(&router, &peer, link_frame(0x86dd, &[0x60; 40]));
    }

    #[test]
    fn short_icmp_to_router_is_dropped() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());
        assert_dropped(
            &router,
            &peer,
            ipv4_frame("10.0.0.2", "10.0.0.1", IpProtocol::ICMP, 64, &[ICMP_ECHO_REQUEST, 0, 0, 0]),
        );
    }

    #[test]
    fn ttl_one_gets_time_exceeded() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());
        router.handle_frame("eth0", ipv4_frame("10.0.0.2", "10.0.1.2", IpProtocol::UDP, 1, &[0; 8]));

        let sent = peer.drain_sent();
        assert_eq!(sent.len(), 1);
        let (iface, frame) = &sent[0];
        assert_eq!(iface, "eth0");
        assert_eq!(frame.dest_mac(), HOST_MAC);
        let packet = Ipv4Packet::try_from(frame.clone()).unwrap();
        assert_eq!(packet.src_addr(), ip("10.0.0.1"));
        assert_eq!(packet.dest_addr(), ip("10.0.0.2"));
        assert_eq!(icmp_in(frame).msg_type(), ICMP_TIME_EXCEEDED);
    }

    #[test]
    fn ping_to_router_is_answered() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());
        let mut echo = IcmpMessage::new(ICMP_ECHO_REQUEST, 0);
        echo.set_body(&[0, 1, 0, 1, 0xab, 0xcd]);
        echo.set_checksum();
        // Pinging the far interface's address still replies from that address
        router.handle_frame(
            "eth0",
            ipv4_frame("10.0.0.2", "10.0.1.1", IpProtocol::ICMP, 64, echo.as_bytes()),
        );

        let (iface, frame) = peer.drain_sent().pop().unwrap();
        assert_eq!(iface, "eth0");
        let packet = Ipv4Packet::try_from(frame.clone()).unwrap();
        assert_eq!(packet.src_addr(), ip("10.0.1.1"));
        let reply = icmp_in(&frame);
        assert_eq!(reply.msg_type(), ICMP_ECHO_REPLY);
        assert_eq!(reply.body(), echo.body());
    }

    #[test]
    fn udp_to_router_gets_port_unreachable() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());
        let mut segment = UdpSegment::new(5000, 53);
        segment.set_payload(b"query");
        router.handle_frame(
            "eth0",
            ipv4_frame("10.0.0.2", "10.0.0.1", IpProtocol::UDP, 64, segment.as_bytes()),
        );

        let (_, frame) = peer.drain_sent().pop().unwrap();
        let message = icmp_in(&frame);
        assert_eq!((message.msg_type(), message.code()), (ICMP_DEST_UNREACHABLE, 3));
    }

    #[test]
    fn other_protocols_to_router_are_dropped() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());
        router.handle_frame(
            "eth0",
            ipv4_frame("10.0.0.2", "10.0.0.1", IpProtocol::Other(89), 64, &[0; 4]),
        );
        assert!(peer.drain_sent().is_empty());
    }

    #[test]
    fn no_route_gets_net_unreachable() {
        let (router, peer) = static_router();
        router.arp().insert(HOST_MAC, ip("10.0.0.2"), Instant::now());
        router.handle_frame("eth0", ipv4_frame("10.0.0.2", "8.8.8.8", IpProtocol::UDP, 64, &[0; 8]));

        let (_, frame) = peer.drain_sent().pop().unwrap();
        let message = icmp_in(&frame);
        assert_eq!((message.msg_type(), message.code()), (ICMP_DEST_UNREACHABLE, 0));
    }

    #[test]
    fn diagnostics_without_return_route_are_suppressed() {
        let (router, peer) = static_router();
        router.handle_frame("eth0", ipv4_frame("172.16.0.9", "8.8.8.8", IpProtocol::UDP, 64, &[0; 8]));
        assert!(peer.drain_sent().is_empty());
        assert_eq!(router.arp().pending(), 0);
    }

    #[test]
    fn never_forwards_out_the_ingress() {
        let (router, peer) = static_router();
        router.handle_frame("eth0", ipv4_frame("10.0.0.2", "10.0.0.3", IpProtocol::UDP, 64, &[0; 8]));
        assert!(peer.drain_sent().is_empty());
        assert_eq!(router.arp().pending(), 0);
    }

    #[test]
    fn forwards_with_known_next_hop() {
        let (router, peer) = static_router();
        let far_mac = MacAddr::new([2, 0, 0, 0, 1, 2]);
        router.arp().insert(far_mac, ip("10.0.1.2"), Instant::now());
        router.handle_frame("eth0", ipv4_frame("10.0.0.2", "10.0.1.2", IpProtocol::UDP, 64, &[7; 8]));

        let (iface, frame) = peer.drain_sent().pop().unwrap();
        assert_eq!(iface, "eth1");
        assert_eq!(frame.dest_mac(), far_mac);
        assert_eq!(frame.src_mac(), MacAddr::new([2, 0, 0, 0, 0, 2]));
        let packet = Ipv4Packet::try_from(frame).unwrap();
        assert_eq!(packet.ttl(), 63);
        assert!(packet.validate_checksum());
        assert_eq!(packet.payload().as_ref(), &[7; 8]);
    }

    #[test]
    fn dynamic_router_bootstraps_rip() {
        let (router, peer) = router_with(vec![]);
        router.init();
        assert!(router.rip().is_running());
        assert_eq!(router.routes().len(), 2);
        let sent = peer.drain_sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, frame)| frame.dest_mac().is_broadcast()));

        router.rip_tick();
        assert_eq!(peer.drain_sent().len(), 2);
    }

    #[test]
    fn static_router_skips_rip() {
        let (router, peer) = static_router();
        router.init();
        assert!(!router.rip().is_running());
        assert!(peer.drain_sent().is_empty());
        router.rip_tick();
        assert!(peer.drain_sent().is_empty());
    }
}
