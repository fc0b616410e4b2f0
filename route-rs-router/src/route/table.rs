use crate::error::{Result, RouterError};
use crate::interface::InterfaceTable;
use route_rs_packets::RIP_INFINITY;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: Ipv4Addr,
    pub mask: Ipv4Addr,
    /// 0.0.0.0 when the destination is directly reachable
    pub gateway: Ipv4Addr,
    pub interface: String,
    pub metric: u32,
    /// `None` for static and directly connected routes, which never age out
    pub time_added: Option<Instant>,
}

impl RouteEntry {
    /// A route that never expires. The destination is normalized to `destination & mask`.
    pub fn fixed(destination: Ipv4Addr, mask: Ipv4Addr, gateway: Ipv4Addr, interface: &str) -> Self {
        RouteEntry {
            destination: apply_mask(destination, mask),
            mask,
            gateway,
            interface: String::from(interface),
            metric: 0,
            time_added: None,
        }
    }

    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        apply_mask(self.destination, self.mask) == apply_mask(ip, self.mask)
    }

    pub fn is_learned(&self) -> bool {
        self.time_added.is_some()
    }

    /// The address frames for `dest` should be resolved to on the egress link
    pub fn next_hop(&self, dest: Ipv4Addr) -> Ipv4Addr {
        if self.gateway.is_unspecified() {
            dest
        } else {
            self.gateway
        }
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:<16}{:<16}{:<16}{:<8}{}",
            self.destination.to_string(),
            self.gateway.to_string(),
            self.mask.to_string(),
            self.interface,
            self.metric
        )
    }
}

pub fn apply_mask(ip: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) & u32::from(mask))
}

/// Ordered route entries behind one lock. Every read and write takes the same mutex; the table
/// is small and each operation is a linear scan.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Mutex<Vec<RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        RouteTable {
            entries: Mutex::new(vec![]),
        }
    }

    pub fn add_entry(&self, entry: RouteEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    /// Returns false if no entry has this destination and mask
    pub fn remove_entry(&self, destination: Ipv4Addr, mask: Ipv4Addr) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match position(&entries, destination, mask) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Rewrites gateway and interface (and the metric, when given) of an existing entry.
    /// Returns false if no entry has this destination and mask.
    pub fn update_entry(
        &self,
        destination: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: &str,
        metric: Option<u32>,
    ) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match position(&entries, destination, mask) {
            Some(index) => {
                let entry = &mut entries[index];
                entry.gateway = gateway;
                entry.interface = String::from(interface);
                if let Some(metric) = metric {
                    entry.metric = metric;
                }
                true
            }
            None => false,
        }
    }

    pub fn find_entry(&self, destination: Ipv4Addr, mask: Ipv4Addr) -> Option<RouteEntry> {
        let entries = self.entries.lock().unwrap();
        position(&entries, destination, mask).map(|index| entries[index].clone())
    }

    /// Installs or refreshes a route heard from a neighbour. The newest advertisement wins
    /// regardless of metric, but never-expiring entries are left alone. Returns false when
    /// the advertisement was ignored.
    pub fn learn(
        &self,
        destination: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        interface: &str,
        metric: u32,
        now: Instant,
    ) -> bool {
        let destination = apply_mask(destination, mask);
        let mut entries = self.entries.lock().unwrap();
        match position(&entries, destination, mask) {
            Some(index) => {
                let entry = &mut entries[index];
                if !entry.is_learned() {
                    return false;
                }
                entry.gateway = gateway;
                entry.interface = String::from(interface);
                entry.metric = metric;
                entry.time_added = Some(now);
            }
            None => entries.push(RouteEntry {
                destination,
                mask,
                gateway,
                interface: String::from(interface),
                metric,
                time_added: Some(now),
            }),
        }
        true
    }

    /// Most specific (numerically largest mask) reachable entry covering `ip`. Ties go to the
    /// entry that was added first.
    pub fn longest_prefix_match(&self, ip: Ipv4Addr) -> Option<RouteEntry> {
        let entries = self.entries.lock().unwrap();
        let mut best: Option<&RouteEntry> = None;
        for entry in entries.iter() {
            if entry.metric >= RIP_INFINITY || !entry.matches(ip) {
                continue;
            }
            match best {
                Some(current) if u32::from(current.mask) >= u32::from(entry.mask) => {}
                _ => best = Some(entry),
            }
        }
        best.cloned()
    }

    /// Drops learned entries older than `timeout`, returning what was removed
    pub fn expire_learned(&self, now: Instant, timeout: Duration) -> Vec<RouteEntry> {
        let mut entries = self.entries.lock().unwrap();
        let mut expired = vec![];
        entries.retain(|entry| match entry.time_added {
            Some(added) if now.saturating_duration_since(added) > timeout => {
                expired.push(entry.clone());
                false
            }
            _ => true,
        });
        expired
    }

    /// Swaps in a whole new set of entries in one step
    pub fn replace(&self, new_entries: Vec<RouteEntry>) {
        *self.entries.lock().unwrap() = new_entries;
    }

    /// Every entry must egress through an interface the router has
    pub fn verify(&self, interfaces: &InterfaceTable) -> Result<()> {
        let entries = self.entries.lock().unwrap();
        match entries
            .iter()
            .find(|entry| !interfaces.contains(&entry.interface))
        {
            Some(entry) => Err(RouterError::UnknownInterface(entry.interface.clone())),
            None => Ok(()),
        }
    }

    pub fn entries(&self) -> Vec<RouteEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

fn position(entries: &[RouteEntry], destination: Ipv4Addr, mask: Ipv4Addr) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.destination == destination && entry.mask == mask)
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries = self.entries.lock().unwrap();
        if entries.is_empty() {
            return write!(f, " * warning * Routing table empty");
        }
        writeln!(
            f,
            "{:<16}{:<16}{:<16}{:<8}Metric",
            "Destination", "Gateway", "Mask", "Iface"
        )?;
        for entry in entries.iter() {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
