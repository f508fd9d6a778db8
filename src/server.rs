//! Registry of terminals and dispatch of their datagrams

use crate::client::{Client, ClientSettings, TimerEvent};
use crate::keys::{remote, RawKeyEvent};
use crate::protocol::{self, IrReport, Message, DATAGRAM_LEN};
use crate::screen::Screen;
use crate::timer::TimerWheel;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Largest datagram read from the socket
pub const RECEIVE_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("short send to {addr}: {sent} of {len} bytes")]
    ShortSend {
        addr: SocketAddr,
        sent: usize,
        len: usize,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no client at {0}")]
    UnknownClient(SocketAddr),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Datagram socket seam between the server and the network
pub trait Transport {
    /// Send one datagram
    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> Result<(), TransportError>;

    /// Receive one datagram, `None` when nothing is waiting
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, TransportError>;
}

impl Transport for UdpSocket {
    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> Result<(), TransportError> {
        let sent = UdpSocket::send_to(self, bytes, addr)?;
        if sent != bytes.len() {
            return Err(TransportError::ShortSend {
                addr,
                sent,
                len: bytes.len(),
            });
        }
        Ok(())
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, TransportError> {
        match UdpSocket::recv_from(self, buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Builds the powered-on screen of a new client
pub type ScreenFactory = Box<dyn Fn() -> Box<dyn Screen>>;

/// Server tunables
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub client: ClientSettings,
    /// Period between sweeps for stale clients
    pub stale_check_interval: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            stale_check_interval: Duration::from_secs(10),
        }
    }
}

/// The server side of the protocol for any number of terminals
pub struct Server<T> {
    transport: T,
    settings: ServerSettings,
    clients: HashMap<SocketAddr, Client>,
    timers: TimerWheel<TimerEvent>,
    screen_factory: ScreenFactory,
}

impl<T: Transport> Server<T> {
    pub fn new(transport: T, settings: ServerSettings, screen_factory: ScreenFactory) -> Self {
        Self {
            transport,
            settings,
            clients: HashMap::new(),
            timers: TimerWheel::new(),
            screen_factory,
        }
    }

    /// Arm the stale client sweep
    pub fn start(&mut self, now: Instant) {
        self.timers
            .schedule(now, self.settings.stale_check_interval, TimerEvent::StaleSweep);
    }

    /// Read and handle every waiting datagram.
    ///
    /// Infrared reports in one burst are coalesced per terminal: only the
    /// last from each is handled, after the rest of the burst. Returns the
    /// number of datagrams read.
    pub fn poll(&mut self, now: Instant) -> Result<usize, TransportError> {
        let mut buf = [0u8; RECEIVE_BUFFER_SIZE];
        // Latest report per terminal, in order of first arrival
        let mut pending_ir: Vec<(SocketAddr, [u8; DATAGRAM_LEN])> = Vec::new();
        let mut count = 0;

        while let Some((len, addr)) = self.transport.recv_from(&mut buf)? {
            count += 1;
            let datagram = &buf[..len];
            if datagram.first() == Some(&IrReport::TAG) && len >= DATAGRAM_LEN {
                let mut report = [0u8; DATAGRAM_LEN];
                report.copy_from_slice(&datagram[..DATAGRAM_LEN]);
                match pending_ir.iter_mut().find(|(from, _)| *from == addr) {
                    Some(slot) => slot.1 = report,
                    None => pending_ir.push((addr, report)),
                }
                continue;
            }
            self.handle_datagram(now, addr, datagram);
        }

        for (addr, report) in pending_ir {
            self.handle_datagram(now, addr, &report);
        }
        Ok(count)
    }

    /// Handle one datagram from `addr`; malformed ones are dropped
    pub fn handle_datagram(&mut self, now: Instant, addr: SocketAddr, bytes: &[u8]) {
        match Message::parse(bytes) {
            Ok(message) => self.handle_message(now, addr, message),
            Err(e) => debug!("dropping datagram from {}: {}", addr, e),
        }
    }

    pub fn handle_message(&mut self, now: Instant, addr: SocketAddr, message: Message) {
        match message {
            Message::Discovery => {
                debug!("discovery from {}", addr);
                send(&mut self.transport, &protocol::discovery_reply(), addr);
            }
            Message::Heartbeat => {
                self.client_mut(now, addr).touch(now);
                send(&mut self.transport, &protocol::heartbeat_reply(), addr);
            }
            Message::Ir(report) => {
                self.client_mut(now, addr).touch(now);
                match remote::lookup(report.remote_id, report.button_code) {
                    Some(key) => {
                        if let Some(client) = self.clients.get_mut(&addr) {
                            let event = RawKeyEvent::new(report.timestamp, key, now);
                            client.process_key(event, &mut self.timers);
                        }
                    }
                    None => debug!(
                        "{}: unknown button 0x{:08x} from remote {}",
                        addr, report.button_code, report.remote_id
                    ),
                }
            }
        }
        self.flush(now, addr);
    }

    /// Fire every timer due at `now`
    pub fn tick(&mut self, now: Instant) -> usize {
        let clients = &mut self.clients;
        let transport = &mut self.transport;
        let sweep_every = self.settings.stale_check_interval;

        self.timers.tick(now, |timers, event| -> Result<(), ServerError> {
            match event {
                TimerEvent::Client { addr, kind } => {
                    let client = clients
                        .get_mut(&addr)
                        .ok_or(ServerError::UnknownClient(addr))?;
                    client.handle_timer(now, kind, timers);
                    if client.take_refresh_request() {
                        send(transport, &client.frame(now), addr);
                    }
                }
                TimerEvent::StaleSweep => {
                    let stale: Vec<SocketAddr> = clients
                        .values()
                        .filter(|c| c.is_stale(now))
                        .map(Client::addr)
                        .collect();
                    for addr in stale {
                        if let Some(mut client) = clients.remove(&addr) {
                            client.close(timers);
                            timers.retain(|e| !e.is_for(addr));
                            info!("client {} went away", addr);
                        }
                    }
                    timers.schedule(now, sweep_every, TimerEvent::StaleSweep);
                }
            }
            Ok(())
        })
    }

    /// Earliest pending timer, for sizing the poll wait
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn client(&self, addr: SocketAddr) -> Option<&Client> {
        self.clients.get(&addr)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The client at `addr`, created on first contact
    fn client_mut(&mut self, now: Instant, addr: SocketAddr) -> &mut Client {
        let settings = &self.settings.client;
        let factory = &self.screen_factory;
        let timers = &mut self.timers;
        self.clients.entry(addr).or_insert_with(|| {
            info!("new client {}", addr);
            let mut client = Client::new(addr, settings.clone(), factory(), now);
            client.start(now, timers);
            client
        })
    }

    /// Send a frame to `addr` if its client asked for one
    fn flush(&mut self, now: Instant, addr: SocketAddr) {
        if let Some(client) = self.clients.get_mut(&addr) {
            if client.take_refresh_request() {
                send(&mut self.transport, &client.frame(now), addr);
            }
        }
    }
}

/// Send and log failures; datagrams are never retried
fn send<T: Transport>(transport: &mut T, bytes: &[u8], addr: SocketAddr) {
    if let Err(e) = transport.send_to(bytes, addr) {
        warn!("send to {} failed: {}", addr, e);
    }
}
