use crate::error::{Result, RouterError};
use route_rs_packets::MacAddr;
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

/// A router port. Immutable once the table is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl Interface {
    pub fn new(name: &str, mac: MacAddr, ip: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Interface {
            name: String::from(name),
            mac,
            ip,
            mask,
        }
    }

    /// The directly connected subnet
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.ip) & u32::from(self.mask))
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\tHWaddr {}\n\tinet addr {} mask {}",
            self.name, self.mac, self.ip, self.mask
        )
    }
}

/// Interfaces keyed by name. Filled in once at startup and only read afterwards, so it is
/// shared without a lock.
#[derive(Clone, Debug, Default)]
pub struct InterfaceTable {
    interfaces: BTreeMap<String, Interface>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        InterfaceTable {
            interfaces: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, interface: Interface) -> Result<()> {
        if self.interfaces.contains_key(&interface.name) {
            return Err(RouterError::DuplicateInterface(interface.name));
        }
        self.interfaces.insert(interface.name.clone(), interface);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// The interface that owns `ip`, if the address is one of ours
    pub fn owning(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.values().find(|iface| iface.ip == ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

impl std::iter::FromIterator<Interface> for InterfaceTable {
    /// Later duplicates replace earlier ones; use `add` to reject them instead.
    fn from_iter<I: IntoIterator<Item = Interface>>(iter: I) -> Self {
        InterfaceTable {
            interfaces: iter
                .into_iter()
                .map(|iface| (iface.name.clone(), iface))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth(n: u8) -> Interface {
        Interface::new(
            &format!("eth{}", n),
            MacAddr::new([2, 0, 0, 0, 0, n]),
            Ipv4Addr::new(10, 0, n, 1),
            Ipv4Addr::new(255, 255, 255, 0),
        )
    }

    #[test]
    fn lookup_by_name_and_address() {
        let table: InterfaceTable = vec![eth(0), eth(1)].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("eth1").unwrap().ip, Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(table.owning(Ipv4Addr::new(10, 0, 0, 1)).unwrap().name, "eth0");
        assert!(table.owning(Ipv4Addr::new(10, 0, 0, 2)).is_none());
        assert!(!table.contains("eth2"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut table = InterfaceTable::new();
        table.add(eth(0)).unwrap();
        assert!(matches!(
            table.add(eth(0)),
            Err(RouterError::DuplicateInterface(name)) if name == "eth0"
        ));
    }

    #[test]
    fn network_masks_host_bits() {
        assert_eq!(eth(3).network(), Ipv4Addr::new(10, 0, 3, 0));
    }
}
