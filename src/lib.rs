//! SliMP3 server - protocol stack for SliMP3 network audio terminals
//!
//! Turns the infrared reports of a terminal into key actions, animates two
//! lines of text for its vacuum fluorescent display and encodes every frame
//! into the display's wire format.

pub mod client;
pub mod config;
pub mod display;
pub mod keys;
pub mod protocol;
pub mod screen;
pub mod server;
pub mod timer;
pub mod vfd;

pub use config::Config;
