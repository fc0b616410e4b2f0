use super::Transport;
use crate::error::{Result, RouterError};
use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::select;
use route_rs_packets::EthernetFrame;
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const MAX_FRAME_LEN: usize = 65_535;
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// One emulated wire: frames go out as datagrams to `peer` and anything arriving on the
/// locally bound socket is taken as a frame for this interface.
#[derive(Clone, Debug)]
pub struct UdpLink {
    pub iface: String,
    pub bind: SocketAddr,
    pub peer: SocketAddr,
}

/// Carries each interface's Ethernet frames inside UDP datagrams, one socket per interface.
/// A reader thread per socket feeds a single inbound channel.
pub struct UdpLinkTransport {
    sockets: HashMap<String, (UdpSocket, SocketAddr)>,
    inbound: Receiver<(String, EthernetFrame)>,
    close_sender: Mutex<Option<Sender<()>>>,
    close_receiver: Receiver<()>,
    stop: Arc<AtomicBool>,
    readers: Mutex<Vec<JoinHandle<()>>>,
}

impl UdpLinkTransport {
    pub fn open(links: Vec<UdpLink>) -> Result<UdpLinkTransport> {
        let (frame_sender, inbound) = unbounded();
        let (close_sender, close_receiver) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let mut sockets = HashMap::new();
        let mut readers = vec![];

        for link in links {
            let link_error = |source: io::Error| RouterError::Link {
                iface: link.iface.clone(),
                source,
            };
            let socket = UdpSocket::bind(link.bind).map_err(link_error)?;
            let reader_socket = socket.try_clone().map_err(link_error)?;
            reader_socket
                .set_read_timeout(Some(READ_TIMEOUT))
                .map_err(link_error)?;

            let name = format!("{}-rx", link.iface);
            let iface = link.iface.clone();
            let frame_sender = frame_sender.clone();
            let stop = Arc::clone(&stop);
            let reader = thread::Builder::new()
                .name(name.clone())
                .spawn(move || read_frames(iface, reader_socket, frame_sender, stop))
                .map_err(|source| RouterError::Spawn { name, source })?;
            readers.push(reader);
            sockets.insert(link.iface, (socket, link.peer));
        }

        Ok(UdpLinkTransport {
            sockets,
            inbound,
            close_sender: Mutex::new(Some(close_sender)),
            close_receiver,
            stop,
            readers: Mutex::new(readers),
        })
    }

    /// Address a link's socket is actually bound to
    pub fn local_addr(&self, iface: &str) -> Option<SocketAddr> {
        self.sockets
            .get(iface)
            .and_then(|(socket, _)| socket.local_addr().ok())
    }
}

fn read_frames(
    iface: String,
    socket: UdpSocket,
    frames: Sender<(String, EthernetFrame)>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = vec![0; MAX_FRAME_LEN];
    while !stop.load(Ordering::Relaxed) {
        let len = match socket.recv(&mut buf) {
            Ok(len) => len,
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
            {
                continue
            }
            Err(e) => {
                warn!("{}: link receive failed: {}", iface, e);
                continue;
            }
        };
        match EthernetFrame::from_buffer(buf[..len].to_vec()) {
            Ok(frame) => {
                if frames.send((iface.clone(), frame)).is_err() {
                    return;
                }
            }
            Err(e) => debug!("{}: dropping runt datagram: {}", iface, e),
        }
    }
}

impl Transport for UdpLinkTransport {
    fn send_frame(&self, iface: &str, frame: &EthernetFrame) -> bool {
        match self.sockets.get(iface) {
            Some((socket, peer)) => match socket.send_to(frame.as_bytes(), peer) {
                Ok(_) => true,
                Err(e) => {
                    warn!("{}: link send failed: {}", iface, e);
                    false
                }
            },
            None => false,
        }
    }

    fn receive_frame(&self) -> Option<(String, EthernetFrame)> {
        select! {
            recv(self.inbound) -> tagged => tagged.ok(),
            recv(self.close_receiver) -> _ => None,
        }
    }

    fn close(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.close_sender.lock().unwrap().take();
        for reader in self.readers.lock().unwrap().drain(..) {
            let _ = reader.join();
        }
    }
}
