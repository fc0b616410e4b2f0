use crate::interface::{Interface, InterfaceTable};
use crate::route::{RouteEntry, RouteTable};
use route_rs_packets::{
    EthernetFrame, Ipv4Packet, MacAddr, RipCommand, RipEntry, RipMessage, UdpSegment,
    RIP_INFINITY, RIP_MULTICAST_ADDR, RIP_PORT,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const RIP_UPDATE_INTERVAL: Duration = Duration::from_millis(10_000);
/// Learned routes not re-advertised within this long are dropped
pub const RIP_ROUTE_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Multicast RIP never leaves the link
const RIP_TTL: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RipState {
    Idle,
    Bootstrapped,
    Running,
}

/// A frame ready to go out of the named interface
pub type Outbound = (String, EthernetFrame);

/// Distance-vector engine over the shared route table. It never transmits by itself: every
/// operation hands back the frames the router should send.
#[derive(Debug)]
pub struct RipEngine {
    state: Mutex<RipState>,
}

impl Default for RipEngine {
    fn default() -> Self {
        RipEngine::new()
    }
}

impl RipEngine {
    pub fn new() -> Self {
        RipEngine {
            state: Mutex::new(RipState::Idle),
        }
    }

    pub fn state(&self) -> RipState {
        *self.state.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.state() == RipState::Running
    }

    /// Seeds the table with the directly connected subnets and asks every neighbour for its
    /// table. With static routes loaded the engine stays idle and nothing is returned.
    pub fn bootstrap(&self, interfaces: &InterfaceTable, routes: &RouteTable) -> Vec<Outbound> {
        let mut state = self.state.lock().unwrap();
        if *state != RipState::Idle {
            return vec![];
        }
        if !routes.is_empty() {
            info!("Static routes configured, RIP disabled");
            return vec![];
        }

        for iface in interfaces.iter() {
            routes.add_entry(RouteEntry::fixed(
                iface.network(),
                iface.mask,
                Ipv4Addr::UNSPECIFIED,
                &iface.name,
            ));
        }
        *state = RipState::Bootstrapped;
        info!("RIP bootstrapped with {} connected networks", interfaces.len());

        interfaces
            .iter()
            .map(|iface| {
                let frame = rip_frame(
                    iface,
                    RIP_MULTICAST_ADDR,
                    MacAddr::BROADCAST,
                    RIP_PORT,
                    &RipMessage::request(),
                );
                (iface.name.clone(), frame)
            })
            .collect()
    }

    /// Moves a bootstrapped engine to Running. Returns false if there was no bootstrap.
    pub fn mark_running(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            RipState::Bootstrapped | RipState::Running => {
                *state = RipState::Running;
                true
            }
            RipState::Idle => false,
        }
    }

    /// Handles a RIP datagram that arrived on `iface`. Requests get the full table back,
    /// unicast to the sender; responses update the table.
    pub fn handle(
        &self,
        iface: &Interface,
        src_mac: MacAddr,
        packet: &Ipv4Packet,
        segment: &UdpSegment,
        routes: &RouteTable,
        now: Instant,
    ) -> Option<Outbound> {
        if !self.is_running() {
            debug!("{}: RIP not running, ignoring message", iface.name);
            return None;
        }
        let message = match RipMessage::try_from(segment.payload().as_ref()) {
            Ok(message) => message,
            Err(e) => {
                debug!("{}: dropping RIP message: {}", iface.name, e);
                return None;
            }
        };

        match message.command {
            RipCommand::Request => {
                let reply = RipMessage::response(advertisement(routes));
                let frame = rip_frame(iface, packet.src_addr(), src_mac, segment.src_port(), &reply);
                debug!("{}: answering RIP request from {}", iface.name, packet.src_addr());
                Some((iface.name.clone(), frame))
            }
            RipCommand::Response => {
                let gateway = packet.src_addr();
                for entry in &message.entries {
                    let metric = (entry.metric + 1).min(RIP_INFINITY);
                    routes.learn(entry.network, entry.mask, gateway, &iface.name, metric, now);
                }
                debug!(
                    "{}: {} routes advertised by {}",
                    iface.name,
                    message.entries.len(),
                    gateway
                );
                None
            }
        }
    }

    /// Periodic update: advertise the whole table on every interface, then age out learned
    /// routes
    pub fn tick(
        &self,
        interfaces: &InterfaceTable,
        routes: &RouteTable,
        now: Instant,
    ) -> Vec<Outbound> {
        if !self.is_running() {
            return vec![];
        }
        let update = RipMessage::response(advertisement(routes));
        let outbound = interfaces
            .iter()
            .map(|iface| {
                let frame = rip_frame(iface, RIP_MULTICAST_ADDR, MacAddr::BROADCAST, RIP_PORT, &update);
                (iface.name.clone(), frame)
            })
            .collect();

        for expired in routes.expire_learned(now, RIP_ROUTE_TIMEOUT) {
            info!(
                "Route to {} mask {} via {} timed out",
                expired.destination, expired.mask, expired.gateway
            );
        }
        outbound
    }
}

fn advertisement(routes: &RouteTable) -> Vec<RipEntry> {
    routes
        .entries()
        .iter()
        .map(|entry| RipEntry::new(entry.destination, entry.mask, entry.metric))
        .collect()
}

fn rip_frame(
    iface: &Interface,
    dest_ip: Ipv4Addr,
    dest_mac: MacAddr,
    dest_port: u16,
    message: &RipMessage,
) -> EthernetFrame {
    let mut segment = UdpSegment::new(RIP_PORT, dest_port);
    segment.set_payload(&message.to_bytes());
    let packet = Ipv4Packet::encap_udp(iface.ip, dest_ip, RIP_TTL, &segment);

    let mut frame = EthernetFrame::encap_ipv4(packet);
    frame.set_src_mac(iface.mac);
    frame.set_dest_mac(dest_mac);
    frame
}
