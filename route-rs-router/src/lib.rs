pub mod arp;
pub mod clock;
pub mod config;
pub mod error;
pub mod icmp;
pub mod interface;
pub mod rip;
pub mod route;
pub mod router;
pub mod timer;
pub mod transport;

pub use self::arp::ArpCache;
pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::config::RouterConfig;
pub use self::error::{Result, RouterError};
pub use self::interface::{Interface, InterfaceTable};
pub use self::rip::{RipEngine, RipState};
pub use self::route::{RouteEntry, RouteTable};
pub use self::router::{Router, RunningRouter};
pub use self::transport::{ChannelPeer, ChannelTransport, Transport, UdpLink, UdpLinkTransport};
