//! SliMP3 server - serves SliMP3 terminals on the local network

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::net::UdpSocket;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use slimp3_server::{
    config::Config,
    screen::{Screen, TextScreen},
    server::{ScreenFactory, Server},
};

/// Longest sleep between socket polls while nothing is due
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(version, about = "Serve SliMP3 terminals on the local network")]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UDP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    let port = args.port.unwrap_or(config.server.port);

    let socket = UdpSocket::bind(("0.0.0.0", port))
        .with_context(|| format!("binding UDP port {}", port))?;
    socket
        .set_nonblocking(true)
        .context("making socket non-blocking")?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    let greeting = config.server.greeting.clone();
    let factory: ScreenFactory =
        Box::new(move || Box::new(TextScreen::centered("main", &greeting)) as Box<dyn Screen>);

    let mut server = Server::new(socket, config.server_settings(), factory);
    server.start(Instant::now());
    info!("listening on UDP port {}", port);

    while running.load(Ordering::SeqCst) {
        let received = match server.poll(Instant::now()) {
            Ok(count) => count,
            Err(e) => {
                warn!("receive failed: {}", e);
                0
            }
        };
        let now = Instant::now();
        server.tick(now);

        if received == 0 {
            std::thread::sleep(idle_wait(now, server.next_deadline()));
        }
    }

    info!("shutting down, {} clients connected", server.client_count());
    Ok(())
}

/// Sleep before the next poll: up to the next timer, never past the interval
fn idle_wait(now: Instant, next_deadline: Option<Instant>) -> Duration {
    next_deadline
        .map_or(POLL_INTERVAL, |at| at.saturating_duration_since(now))
        .min(POLL_INTERVAL)
}
