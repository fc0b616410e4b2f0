//! Router configuration file.
//!
//! ```toml
//! rtable = "rtable"
//!
//! [[interface]]
//! name = "eth0"
//! mac = "02:00:00:00:00:01"
//! ip = "10.0.0.1"
//! mask = "255.255.255.0"
//! bind = "127.0.0.1:7000"
//! peer = "127.0.0.1:7100"
//! ```
//!
//! Without `rtable` the router runs RIP. Relative `rtable` paths are resolved against the
//! config file's directory.

use crate::error::{Result, RouterError};
use crate::interface::{Interface, InterfaceTable};
use crate::transport::UdpLink;
use route_rs_packets::MacAddr;
use serde::Deserialize;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Static route file; absent means dynamic routing
    #[serde(default)]
    pub rtable: Option<PathBuf>,
    #[serde(rename = "interface", default)]
    pub interfaces: Vec<InterfaceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceConfig {
    pub name: String,
    pub mac: String,
    pub ip: Ipv4Addr,
    pub mask: Ipv4Addr,
    /// Local UDP endpoint carrying this interface's frames
    pub bind: Option<SocketAddr>,
    /// Where this interface's frames are sent
    pub peer: Option<SocketAddr>,
}

impl RouterConfig {
    pub fn from_toml(contents: &str) -> Result<RouterConfig> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<RouterConfig> {
        let contents = fs::read_to_string(path).map_err(|source| RouterError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = RouterConfig::from_toml(&contents)?;
        if let (Some(rtable), Some(dir)) = (config.rtable.as_mut(), path.parent()) {
            if rtable.is_relative() {
                let resolved = dir.join(&*rtable);
                *rtable = resolved;
            }
        }
        Ok(config)
    }

    pub fn interface_table(&self) -> Result<InterfaceTable> {
        let mut table = InterfaceTable::new();
        for iface in &self.interfaces {
            let mac = iface
                .mac
                .parse::<MacAddr>()
                .map_err(|reason| RouterError::BadMac {
                    iface: iface.name.clone(),
                    mac: iface.mac.clone(),
                    reason,
                })?;
            table.add(Interface::new(&iface.name, mac, iface.ip, iface.mask))?;
        }
        Ok(table)
    }

    /// UDP endpoints for every interface. Each one needs both `bind` and `peer`.
    pub fn udp_links(&self) -> Result<Vec<UdpLink>> {
        self.interfaces
            .iter()
            .map(|iface| match (iface.bind, iface.peer) {
                (Some(bind), Some(peer)) => Ok(UdpLink {
                    iface: iface.name.clone(),
                    bind,
                    peer,
                }),
                _ => Err(RouterError::MissingLink(iface.name.clone())),
            })
            .collect()
    }
}
