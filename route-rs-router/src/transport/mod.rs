//! Link layer the router sends and receives Ethernet frames on. The router only ever sees
//! whole frames tagged with an interface name.

use route_rs_packets::EthernetFrame;

mod channel;
pub use self::channel::*;

mod udp;
pub use self::udp::*;

pub trait Transport: Send + Sync {
    /// Puts `frame` on the wire of interface `iface`. Returns false if it could not be sent.
    fn send_frame(&self, iface: &str, frame: &EthernetFrame) -> bool;

    /// Blocks for the next inbound frame. `None` means the session has ended and no further
    /// frames will arrive.
    fn receive_frame(&self) -> Option<(String, EthernetFrame)>;

    /// Ends the session. Any blocked `receive_frame` returns `None`.
    fn close(&self);
}
