//! Remote control key handling
//!
//! Raw "button is down" reports are translated through the remote tables in
//! [`remote`] and classified into [`KeyCode`] actions by [`KeyClassifier`].

pub mod classifier;
mod event;
pub mod remote;

pub use classifier::{HoldThreshold, KeyClassifier, KeyTiming};
pub use event::{KeyCode, KeyId, Phase, RawKeyEvent};
