use route_rs_packets::{EthernetFrame, MacAddr};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const ARP_TICK_INTERVAL: Duration = Duration::from_millis(1_000);
/// How long a resolved address stays usable
pub const ARP_ENTRY_TIMEOUT: Duration = Duration::from_millis(15_000);
/// Minimum spacing between two requests for the same address
pub const ARP_RETRY_INTERVAL: Duration = Duration::from_millis(1_000);
/// Requests sent before a resolution is abandoned
pub const ARP_MAX_REQUESTS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpEntry {
    pub mac: MacAddr,
    pub added: Instant,
}

/// A resolution in flight, with the frames waiting on it in arrival order
#[derive(Clone, Debug)]
pub struct ArpRequest {
    pub ip: Ipv4Addr,
    /// Where the requests go out, fixed by the first frame queued
    pub iface: String,
    pub last_sent: Option<Instant>,
    pub sent_count: u32,
    pub queue: Vec<EthernetFrame>,
}

impl ArpRequest {
    fn new(ip: Ipv4Addr, iface: &str) -> Self {
        ArpRequest {
            ip,
            iface: String::from(iface),
            last_sent: None,
            sent_count: 0,
            queue: vec![],
        }
    }
}

/// What the caller should do on behalf of a pending resolution
#[derive(Clone, Debug)]
pub enum RequestUpdate {
    /// Nothing yet, a request went out recently
    Wait,
    /// Broadcast an ARP request for `target` on `iface`
    Probe { target: Ipv4Addr, iface: String },
    /// Retries ran out; the request has been removed along with its queue
    Exhausted(ArpRequest),
}

/// IP to MAC cache plus the pending request queue. Both maps sit behind their own lock and
/// neither lock is held while a frame is transmitted; the cache hands back `RequestUpdate`s
/// for the router to act on.
#[derive(Debug, Default)]
pub struct ArpCache {
    entries: Mutex<HashMap<Ipv4Addr, ArpEntry>>,
    requests: Mutex<HashMap<Ipv4Addr, ArpRequest>>,
}

impl ArpCache {
    pub fn new() -> Self {
        ArpCache {
            entries: Mutex::new(HashMap::new()),
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.lock().unwrap().get(&ip).map(|entry| entry.mac)
    }

    /// Records a mapping learned from an ARP reply. Returns the pending request for `ip`, if
    /// there was one, so its queued frames can be sent.
    pub fn insert(&self, mac: MacAddr, ip: Ipv4Addr, now: Instant) -> Option<ArpRequest> {
        self.entries
            .lock()
            .unwrap()
            .insert(ip, ArpEntry { mac, added: now });
        self.requests.lock().unwrap().remove(&ip)
    }

    /// Queues `frame` until `next_hop` resolves. The first frame for an address creates the
    /// request; a request goes out immediately unless one was sent within the retry interval.
    pub fn resolve(
        &self,
        frame: EthernetFrame,
        iface: &str,
        next_hop: Ipv4Addr,
        now: Instant,
    ) -> RequestUpdate {
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .entry(next_hop)
            .or_insert_with(|| ArpRequest::new(next_hop, iface));
        request.queue.push(frame);
        let update = advance(request, now);
        if let RequestUpdate::Exhausted(_) = update {
            requests.remove(&next_hop);
        }
        update
    }

    /// Periodic maintenance: drop stale entries and move every pending request along
    pub fn tick(&self, now: Instant) -> Vec<RequestUpdate> {
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| now.saturating_duration_since(entry.added) <= ARP_ENTRY_TIMEOUT);

        let mut requests = self.requests.lock().unwrap();
        let mut updates = vec![];
        for request in requests.values_mut() {
            match advance(request, now) {
                RequestUpdate::Wait => {}
                update => updates.push(update),
            }
        }
        for update in &updates {
            if let RequestUpdate::Exhausted(request) = update {
                requests.remove(&request.ip);
            }
        }
        updates
    }

    pub fn entries(&self) -> Vec<(Ipv4Addr, ArpEntry)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(ip, entry)| (*ip, *entry))
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn advance(request: &mut ArpRequest, now: Instant) -> RequestUpdate {
    if let Some(last_sent) = request.last_sent {
        if now.saturating_duration_since(last_sent) < ARP_RETRY_INTERVAL {
            return RequestUpdate::Wait;
        }
    }
    if request.sent_count >= ARP_MAX_REQUESTS {
        return RequestUpdate::Exhausted(request.clone());
    }
    request.last_sent = Some(now);
    request.sent_count += 1;
    RequestUpdate::Probe {
        target: request.ip,
        iface: request.iface.clone(),
    }
}
