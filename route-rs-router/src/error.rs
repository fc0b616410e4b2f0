//! Configuration-time errors. Per-packet problems never reach the caller: the forwarding
//! pipeline logs and drops them.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("unable to read route table {path}: {source}")]
    RouteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid entry in route table {path} line {line}: {reason}")]
    MalformedRoute {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("route table references unknown interface {0}")]
    UnknownInterface(String),

    #[error("duplicate interface {0}")]
    DuplicateInterface(String),

    #[error("unable to read config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("interface {iface} has invalid MAC address {mac}: {reason}")]
    BadMac {
        iface: String,
        mac: String,
        reason: &'static str,
    },

    #[error("interface {0} has no UDP link configured")]
    MissingLink(String),

    #[error("link setup for {iface} failed: {source}")]
    Link {
        iface: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RouterError>;
