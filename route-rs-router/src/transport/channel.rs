use super::Transport;
use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::select;
use route_rs_packets::EthernetFrame;
use std::sync::Mutex;
use std::time::Duration;

type TaggedFrame = (String, EthernetFrame);

/// In-process link layer. The router holds the `ChannelTransport`; whatever plays the rest of
/// the network holds the matching `ChannelPeer`.
pub struct ChannelTransport {
    inbound: Receiver<TaggedFrame>,
    outbound: Sender<TaggedFrame>,
    close_sender: Mutex<Option<Sender<()>>>,
    close_receiver: Receiver<()>,
}

/// The far side of a `ChannelTransport`
pub struct ChannelPeer {
    to_router: Sender<TaggedFrame>,
    from_router: Receiver<TaggedFrame>,
}

impl ChannelTransport {
    pub fn pair() -> (ChannelTransport, ChannelPeer) {
        let (to_router, inbound) = unbounded();
        let (outbound, from_router) = unbounded();
        let (close_sender, close_receiver) = unbounded();
        (
            ChannelTransport {
                inbound,
                outbound,
                close_sender: Mutex::new(Some(close_sender)),
                close_receiver,
            },
            ChannelPeer {
                to_router,
                from_router,
            },
        )
    }
}

impl Transport for ChannelTransport {
    fn send_frame(&self, iface: &str, frame: &EthernetFrame) -> bool {
        self.outbound
            .send((String::from(iface), frame.clone()))
            .is_ok()
    }

    fn receive_frame(&self) -> Option<TaggedFrame> {
        select! {
            recv(self.inbound) -> tagged => tagged.ok(),
            recv(self.close_receiver) -> _ => None,
        }
    }

    fn close(&self) {
        // Dropping the only sender disconnects close_receiver
        self.close_sender.lock().unwrap().take();
    }
}

impl ChannelPeer {
    /// Delivers `frame` to the router as if it arrived on `iface`
    pub fn inject(&self, iface: &str, frame: EthernetFrame) {
        // A closed router simply never sees the frame
        let _ = self.to_router.send((String::from(iface), frame));
    }

    /// Next frame the router sent, waiting up to `timeout`
    pub fn next_sent(&self, timeout: Duration) -> Option<TaggedFrame> {
        self.from_router.recv_timeout(timeout).ok()
    }

    /// Everything the router has sent so far, without waiting
    pub fn drain_sent(&self) -> Vec<TaggedFrame> {
        self.from_router.try_iter().collect()
    }
}
