use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

pub const RIP_PORT: u16 = 520;
pub const RIP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 9);
pub const RIP_INFINITY: u32 = 16;

const RIP_VERSION: u8 = 2;
const RIP_HEADER_LEN: usize = 4;
const RIP_ENTRY_LEN: usize = 20;
const AFI_INET: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RipCommand {
    Request = 1,
    Response = 2,
}

/// One advertised route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RipEntry {
    pub network: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub metric: u32,
}

impl RipEntry {
    pub fn new(network: Ipv4Addr, mask: Ipv4Addr, metric: u32) -> RipEntry {
        RipEntry {
            network,
            mask,
            next_hop: Ipv4Addr::UNSPECIFIED,
            metric: metric.min(RIP_INFINITY),
        }
    }
}

/// RIPv2 message (RFC 2453). Unlike the other packet types this is a parsed representation,
/// since the entry list has no fixed layout to hand out accessors for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RipMessage {
    pub command: RipCommand,
    pub entries: Vec<RipEntry>,
}

impl RipMessage {
    /// Request for the neighbour's whole table
    pub fn request() -> RipMessage {
        RipMessage {
            command: RipCommand::Request,
            entries: vec![],
        }
    }

    pub fn response(entries: Vec<RipEntry>) -> RipMessage {
        RipMessage {
            command: RipCommand::Response,
            entries,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(RIP_HEADER_LEN + RIP_ENTRY_LEN * self.entries.len().max(1));
        bytes.push(self.command as u8);
        bytes.push(RIP_VERSION);
        bytes.extend(&[0, 0]);

        if self.command == RipCommand::Request && self.entries.is_empty() {
            // Whole table request: a single entry with AFI 0 and metric infinity
            bytes.extend(&[0; RIP_ENTRY_LEN - 4]);
            bytes.extend(&RIP_INFINITY.to_be_bytes());
            return bytes;
        }

        for entry in &self.entries {
            bytes.extend(&AFI_INET.to_be_bytes());
            bytes.extend(&[0, 0]); // route tag
            bytes.extend(&entry.network.octets());
            bytes.extend(&entry.mask.octets());
            bytes.extend(&entry.next_hop.octets());
            bytes.extend(&entry.metric.min(RIP_INFINITY).to_be_bytes());
        }
        bytes
    }
}

impl TryFrom<&[u8]> for RipMessage {
    type Error = &'static str;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() < RIP_HEADER_LEN {
            return Err("Data is too short to be a RIP message");
        }
        let command = match data[0] {
            1 => RipCommand::Request,
            2 => RipCommand::Response,
            _ => return Err("Unknown RIP command"),
        };
        if (data.len() - RIP_HEADER_LEN) % RIP_ENTRY_LEN != 0 {
            return Err("RIP message length is not a whole number of entries");
        }

        let entries = data[RIP_HEADER_LEN..]
            .chunks_exact(RIP_ENTRY_LEN)
            .filter(|entry| u16::from_be_bytes([entry[0], entry[1]]) == AFI_INET)
            .map(|entry| {
                let addr = |at: usize| -> Ipv4Addr {
                    let octets: [u8; 4] = entry[at..at + 4].try_into().unwrap();
                    Ipv4Addr::from(octets)
                };
                let metric = u32::from_be_bytes(entry[16..20].try_into().unwrap());
                RipEntry {
                    network: addr(4),
                    mask: addr(8),
                    next_hop: addr(12),
                    metric: metric.min(RIP_INFINITY),
                }
            })
            .collect();

        Ok(RipMessage { command, entries })
    }
}
