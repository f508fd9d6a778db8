//! Integration tests for the SliMP3 server
//!
//! These tests drive a `Server` through an in-memory transport with
//! synthetic clocks: datagrams in, timers ticking, display frames out.

use slimp3_server::client::ClientSettings;
use slimp3_server::display::{AnimatorSettings, Content};
use slimp3_server::protocol::{IrReport, DATAGRAM_LEN};
use slimp3_server::screen::{Screen, TextScreen};
use slimp3_server::server::{ScreenFactory, Server, ServerSettings, Transport, TransportError};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CH_DOWN: u32 = 0x0000_f78d;
const VOLUME_UP: u32 = 0x0000_f778;
const POWER: u32 = 0x0000_f702;

#[derive(Default)]
struct MemoryTransport {
    inbound: VecDeque<(Vec<u8>, SocketAddr)>,
    sent: Vec<(Vec<u8>, SocketAddr)>,
}

impl Transport for MemoryTransport {
    fn send_to(&mut self, bytes: &[u8], addr: SocketAddr) -> Result<(), TransportError> {
        self.sent.push((bytes.to_vec(), addr));
        Ok(())
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, TransportError> {
        Ok(self.inbound.pop_front().map(|(bytes, addr)| {
            buf[..bytes.len()].copy_from_slice(&bytes);
            (bytes.len(), addr)
        }))
    }
}

fn terminal() -> SocketAddr {
    "192.168.0.42:3483".parse().unwrap()
}

fn settings(client: ClientSettings) -> ServerSettings {
    ServerSettings {
        client,
        ..ServerSettings::default()
    }
}

fn powered_on() -> ClientSettings {
    ClientSettings {
        start_powered_on: true,
        ..ClientSettings::default()
    }
}

fn server_with(settings: ServerSettings) -> Server<MemoryTransport> {
    let factory: ScreenFactory = Box::new(|| {
        Box::new(TextScreen::new("main", Content::new(["Hello there", "SliMP3"]))) as Box<dyn Screen>
    });
    Server::new(MemoryTransport::default(), settings, factory)
}

fn ir(code: u32) -> [u8; DATAGRAM_LEN] {
    IrReport {
        timestamp: 1234,
        remote_id: 0,
        sig_bits: 16,
        button_code: code,
    }
    .to_bytes()
}

fn taken(server: &mut Server<MemoryTransport>) -> Vec<Vec<u8>> {
    server
        .transport_mut()
        .sent
        .drain(..)
        .map(|(bytes, _)| bytes)
        .collect()
}

fn frames(sent: &[Vec<u8>]) -> Vec<&Vec<u8>> {
    sent.iter().filter(|b| b[0] == b'l').collect()
}

/// Device codes of both lines of a frame, as text
fn frame_text(frame: &[u8]) -> (String, String) {
    let pairs: Vec<(u8, u8)> = frame[18..].chunks(2).map(|p| (p[0], p[1])).collect();
    let home = pairs.iter().position(|p| *p == (0x02, 0x03)).unwrap();
    let cells: Vec<char> = pairs[home + 1..].iter().map(|(_, v)| *v as char).collect();
    (cells[..40].iter().collect(), cells[41..81].iter().collect())
}

/// Deliver one report and service timers the way the poll loop does
fn report(server: &mut Server<MemoryTransport>, now: Instant, code: u32) {
    server.handle_datagram(now, terminal(), &ir(code));
    server.tick(now);
}

fn run_until(server: &mut Server<MemoryTransport>, from: Instant, until: Instant) {
    let mut now = from;
    while now <= until {
        server.tick(now);
        now += Duration::from_millis(50);
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[test]
fn discovery_gets_18_byte_reply() {
    let mut server = server_with(ServerSettings::default());
    let mut request = [0u8; DATAGRAM_LEN];
    request[0] = b'd';
    server.handle_datagram(Instant::now(), terminal(), &request);

    let sent = taken(&mut server);
    let mut expected = vec![0u8; DATAGRAM_LEN];
    expected[0] = b'D';
    assert_eq!(sent, vec![expected]);
}

#[test]
fn heartbeat_brings_up_the_clock() {
    let mut server = server_with(ServerSettings::default());
    server.handle_datagram(Instant::now(), terminal(), b"h");

    let sent = taken(&mut server);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0][0], b'h');
    assert_eq!(sent[1][0], b'l');

    let client = server.client(terminal()).unwrap();
    assert_eq!(client.screen_name(), "clock");
    assert!(!client.is_powered_on());
}

#[test]
fn malformed_datagrams_create_nothing() {
    let mut server = server_with(ServerSettings::default());
    let now = Instant::now();
    server.handle_datagram(now, terminal(), b"i\0\0");
    server.handle_datagram(now, terminal(), b"x");
    server.handle_datagram(now, terminal(), b"");
    assert_eq!(server.client_count(), 0);
    assert!(taken(&mut server).is_empty());
}

// ---------------------------------------------------------------------------
// Key handling through the wire
// ---------------------------------------------------------------------------

#[test]
fn power_key_switches_to_main_screen() {
    let mut server = server_with(ServerSettings::default());
    let t0 = Instant::now();
    server.handle_datagram(t0, terminal(), b"h");
    taken(&mut server);

    report(&mut server, t0, POWER);
    let sent = taken(&mut server);
    let frame = frames(&sent).last().copied().unwrap();
    let (line0, line1) = frame_text(frame);
    assert!(line0.starts_with("Hello there"));
    assert!(line1.starts_with("SliMP3"));
    assert!(server.client(terminal()).unwrap().is_powered_on());
}

#[test]
fn brightness_change_shows_in_the_next_frame() {
    let mut server = server_with(settings(powered_on()));
    let t0 = Instant::now();
    server.handle_datagram(t0, terminal(), b"h");
    taken(&mut server);

    report(&mut server, t0, CH_DOWN);
    let sent = taken(&mut server);
    let frame = frames(&sent).last().copied().unwrap();
    // Brightness data byte follows the three setup commands
    assert_eq!(&frame[24..26], &[0x03, 0x01]);
    assert_eq!(server.client(terminal()).unwrap().brightness(), 2);
}

#[test]
fn holding_volume_up_repeats_after_hold() {
    let mut server = server_with(settings(powered_on()));
    let t0 = Instant::now();
    server.handle_datagram(t0, terminal(), b"h");

    // Reports every 100ms for 1.2s: First, Held at 600ms, Repeat from 700ms
    for step in 0..=12u64 {
        report(&mut server, t0 + Duration::from_millis(step * 100), VOLUME_UP);
    }
    let client = server.client(terminal()).unwrap();
    assert_eq!(client.volume(), 50 + 5 + 6 * 5);
    assert_eq!(client.overlay_name(), Some("volume"));

    // The overlay goes away three seconds after the last change
    run_until(
        &mut server,
        t0 + Duration::from_millis(1250),
        t0 + Duration::from_millis(4300),
    );
    let client = server.client(terminal()).unwrap();
    assert_eq!(client.overlay_name(), None);
    assert_eq!(client.volume(), 85);
}

#[test]
fn volume_overlay_frame_uses_custom_glyphs() {
    let mut server = server_with(settings(powered_on()));
    let t0 = Instant::now();
    server.handle_datagram(t0, terminal(), b"h");
    taken(&mut server);

    report(&mut server, t0, VOLUME_UP);
    let sent = taken(&mut server);
    let frame = frames(&sent).last().copied().unwrap();

    // Glyph definitions sit between the brightness byte and entry mode
    let pairs: Vec<(u8, u8)> = frame[18..].chunks(2).map(|p| (p[0], p[1])).collect();
    let defines = pairs
        .iter()
        .filter(|(prefix, op)| *prefix == 0x02 && (0x40..0x80).contains(op))
        .count();
    // 55% is eleven full cells: begin cap, full bar, empty bar, end cap
    assert_eq!(defines, 4);
    let (line0, _) = frame_text(frame);
    assert_eq!(line0.trim(), "Volume");
}

#[test]
fn key_during_screensaver_only_wakes_the_display() {
    let client = ClientSettings {
        start_powered_on: true,
        animator: AnimatorSettings {
            screensaver_timeout: Duration::from_secs(1),
            ..AnimatorSettings::default()
        },
        ..ClientSettings::default()
    };
    let mut server = server_with(settings(client));
    let t0 = Instant::now();
    server.handle_datagram(t0, terminal(), b"h");
    run_until(&mut server, t0, t0 + Duration::from_millis(1500));
    assert!(server
        .client(terminal())
        .unwrap()
        .animator()
        .is_screensaver_active());

    report(&mut server, t0 + Duration::from_millis(1600), CH_DOWN);
    let client = server.client(terminal()).unwrap();
    assert!(!client.animator().is_screensaver_active());
    assert_eq!(client.brightness(), 3);
}

#[test]
fn unknown_buttons_are_ignored() {
    let mut server = server_with(settings(powered_on()));
    let t0 = Instant::now();
    report(&mut server, t0, 0x1234_5678);
    let client = server.client(terminal()).unwrap();
    assert_eq!(client.brightness(), 3);
    assert_eq!(client.volume(), 50);
    assert_eq!(client.overlay_name(), None);
}

// ---------------------------------------------------------------------------
// Client lifetime
// ---------------------------------------------------------------------------

#[test]
fn silent_client_is_dropped_with_its_timers() {
    let mut server = server_with(ServerSettings::default());
    let t0 = Instant::now();
    server.start(t0);
    server.handle_datagram(t0, terminal(), b"h");
    assert_eq!(server.client_count(), 1);

    server.tick(t0 + Duration::from_secs(61));
    assert_eq!(server.client_count(), 0);
    // Only the next sweep remains
    assert_eq!(server.pending_timers(), 1);
}

#[test]
fn heartbeats_keep_a_client_alive() {
    let mut server = server_with(ServerSettings::default());
    let t0 = Instant::now();
    server.start(t0);
    server.handle_datagram(t0, terminal(), b"h");
    server.handle_datagram(t0 + Duration::from_secs(50), terminal(), b"h");

    server.tick(t0 + Duration::from_secs(61));
    assert_eq!(server.client_count(), 1);
}

#[test]
fn refresh_keeps_frames_flowing() {
    let mut server = server_with(settings(powered_on()));
    let t0 = Instant::now();
    server.handle_datagram(t0, terminal(), b"h");
    taken(&mut server);

    run_until(&mut server, t0, t0 + Duration::from_millis(1000));
    let sent = taken(&mut server);
    // 250, 500, 750 and 1000ms
    assert_eq!(frames(&sent).len(), 4);
}

#[test]
fn poll_drains_the_socket() {
    let mut server = server_with(ServerSettings::default());
    let inbound = &mut server.transport_mut().inbound;
    inbound.push_back((b"d".to_vec(), terminal()));
    inbound.push_back((b"h".to_vec(), terminal()));

    assert_eq!(server.poll(Instant::now()).unwrap(), 2);
    let tags: Vec<u8> = taken(&mut server).iter().map(|b| b[0]).collect();
    assert_eq!(tags, vec![b'D', b'h', b'l']);
    assert_eq!(server.poll(Instant::now()).unwrap(), 0);
}
