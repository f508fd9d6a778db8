//! Key identifiers and classified key events

use crate::protocol::TICKS_PER_SECOND;
use std::fmt;
use std::time::Instant;

/// Abstract remote-control button, independent of the remote model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Rewind,
    FastForward,
    ChannelUp,
    ChannelDown,
    Display,
    Guide,
    MenuHome,
    Mute,
    Ok,
    Shuffle,
    Pause,
    Pip,
    Play,
    Power,
    Record,
    Repeat,
    Sleep,
    Stop,
    VolumeDown,
    VolumeUp,
}

impl KeyId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Digit0 => "0",
            Self::Digit1 => "1",
            Self::Digit2 => "2",
            Self::Digit3 => "3",
            Self::Digit4 => "4",
            Self::Digit5 => "5",
            Self::Digit6 => "6",
            Self::Digit7 => "7",
            Self::Digit8 => "8",
            Self::Digit9 => "9",
            Self::ArrowUp => "arrowUp",
            Self::ArrowDown => "arrowDown",
            Self::ArrowLeft => "arrowLeft",
            Self::ArrowRight => "arrowRight",
            Self::Rewind => "rewind",
            Self::FastForward => "fastForward",
            Self::ChannelUp => "channelUp",
            Self::ChannelDown => "channelDown",
            Self::Display => "display",
            Self::Guide => "guide",
            Self::MenuHome => "menuHome",
            Self::Mute => "mute",
            Self::Ok => "ok",
            Self::Shuffle => "shuffle",
            Self::Pause => "pause",
            Self::Pip => "pip",
            Self::Play => "play",
            Self::Power => "power",
            Self::Record => "record",
            Self::Repeat => "repeat",
            Self::Sleep => "sleep",
            Self::Stop => "stop",
            Self::VolumeDown => "volumeDown",
            Self::VolumeUp => "volumeUp",
        }
    }

    /// Numeric value of a digit key
    pub fn digit(&self) -> Option<u8> {
        let value = match self {
            Self::Digit0 => 0,
            Self::Digit1 => 1,
            Self::Digit2 => 2,
            Self::Digit3 => 3,
            Self::Digit4 => 4,
            Self::Digit5 => 5,
            Self::Digit6 => 6,
            Self::Digit7 => 7,
            Self::Digit8 => 8,
            Self::Digit9 => 9,
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where in the life of a press a key event sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Key seen for the first time
    First,
    /// Key still down after the hold threshold
    Held,
    /// Key still down after `Held` was emitted
    Repeat,
    /// Key released before the hold threshold
    Release,
    /// Key released after `Held` was emitted
    ReleaseHeld,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Held => "Held",
            Self::Repeat => "Repeat",
            Self::Release => "Release",
            Self::ReleaseHeld => "ReleaseHeld",
        }
    }

    /// Whether this phase ends a press
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release | Self::ReleaseHeld)
    }
}

/// A classified key action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode {
    pub key: KeyId,
    pub phase: Phase,
}

impl KeyCode {
    pub fn new(key: KeyId, phase: Phase) -> Self {
        Self { key, phase }
    }

    /// Whether this action matches `key` in any of `phases`
    pub fn is(&self, key: KeyId, phases: &[Phase]) -> bool {
        self.key == key && phases.contains(&self.phase)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.key.name(), self.phase.name())
    }
}

/// One "button is down" report from a terminal
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    /// Wrapping hardware clock of the terminal
    pub device_ticks: u32,
    /// The translated button
    pub key: KeyId,
    /// When the report reached us
    pub received: Instant,
}

impl RawKeyEvent {
    pub fn new(device_ticks: u32, key: KeyId, received: Instant) -> Self {
        Self {
            device_ticks,
            key,
            received,
        }
    }

    /// Hardware timestamp in seconds since the terminal's clock last wrapped
    pub fn device_seconds(&self) -> f64 {
        self.device_ticks as f64 / TICKS_PER_SECOND as f64
    }
}
