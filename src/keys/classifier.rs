//! Conversion of raw "button is down" reports into key actions
//!
//! The terminal only reports that a button is down, repeatedly, for as long
//! as it is held. There is no key-up message. A periodic release check armed
//! on the shared [`TimerWheel`] looks for silence since its previous firing
//! and emits the terminal event of the press when it finds it.
//!
//! Per press the emitted phases are always
//! `First (Held Repeat*)? (Release | ReleaseHeld)`.

use super::{KeyCode, KeyId, Phase};
use crate::timer::{TimerHandle, TimerWheel};
use log::debug;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// When a press counts as held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldThreshold {
    /// Held once the key has been down this long
    Elapsed(Duration),
    /// Held once this many observations of the key arrived, the first included
    Count(u32),
}

impl HoldThreshold {
    fn reached(&self, down_for: Duration, down_count: u32) -> bool {
        match *self {
            Self::Elapsed(threshold) => down_for >= threshold,
            Self::Count(threshold) => down_count >= threshold,
        }
    }
}

/// Timing parameters for key classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTiming {
    /// Period of the release check
    pub check_interval: Duration,
    /// When a press becomes held
    pub hold: HoldThreshold,
}

impl Default for KeyTiming {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_millis(256),
            hold: HoldThreshold::Elapsed(Duration::from_millis(512)),
        }
    }
}

/// The key currently down
#[derive(Debug, Clone)]
struct Press {
    key: KeyId,
    first_seen: Instant,
    last_seen: Instant,
    /// `last_seen` as of the previous release check
    checked_seen: Instant,
    held_emitted: bool,
    down_count: u32,
}

/// Key action classifier for one terminal.
///
/// `E` is the timer event that the owner routes back to
/// [`KeyClassifier::check_release`] when it fires.
pub struct KeyClassifier<E> {
    timing: KeyTiming,
    press: Option<Press>,
    release_timer: Option<TimerHandle>,
    /// Withhold the release of the current press
    silenced: bool,
    check_event: E,
    event_tx: mpsc::Sender<KeyCode>,
}

impl<E: Clone> KeyClassifier<E> {
    /// Create a classifier delivering its actions on `event_tx`
    pub fn new(timing: KeyTiming, check_event: E, event_tx: mpsc::Sender<KeyCode>) -> Self {
        Self {
            timing,
            press: None,
            release_timer: None,
            silenced: false,
            check_event,
            event_tx,
        }
    }

    /// Record an observation of `key` being down
    pub fn observe(&mut self, now: Instant, key: KeyId, timers: &mut TimerWheel<E>) {
        let hold = self.timing.hold;

        if let Some(press) = self.press.as_mut().filter(|p| p.key == key) {
            press.last_seen = now;
            press.down_count += 1;

            let phase = if press.held_emitted {
                Some(Phase::Repeat)
            } else if hold.reached(now.duration_since(press.first_seen), press.down_count) {
                press.held_emitted = true;
                Some(Phase::Held)
            } else {
                None
            };

            if let Some(phase) = phase {
                self.emit(key, phase);
            }
            return;
        }

        // A different key: settle the previous press first so none of its
        // events leak past this point.
        if self.press.is_some() {
            self.force_release(timers);
        }
        self.silenced = false;

        self.press = Some(Press {
            key,
            first_seen: now,
            last_seen: now,
            checked_seen: now,
            held_emitted: false,
            down_count: 1,
        });
        self.arm(now, timers);
        self.emit(key, Phase::First);
    }

    /// Run the release check; called by the owner when the check timer fires
    pub fn check_release(&mut self, now: Instant, timers: &mut TimerWheel<E>) {
        self.release_timer = None;

        let Some(press) = self.press.as_mut() else {
            return;
        };

        if press.last_seen != press.checked_seen {
            press.checked_seen = press.last_seen;
            self.arm(now, timers);
            return;
        }

        self.finish_press();
    }

    /// Silence the classifier after a screen change.
    ///
    /// A press in progress keeps being tracked and keeps repeating, but its
    /// release is not delivered to the new screen.
    pub fn reset(&mut self) {
        if self.release_timer.is_some() {
            self.silenced = true;
        } else {
            self.press = None;
            self.silenced = false;
        }
    }

    /// Drop all state and the pending release check
    pub fn clear(&mut self, timers: &mut TimerWheel<E>) {
        if let Some(handle) = self.release_timer.take() {
            timers.cancel(handle);
        }
        self.press = None;
        self.silenced = false;
    }

    /// Whether no key is down
    pub fn is_idle(&self) -> bool {
        self.press.is_none()
    }

    /// Whether the release of the current press will be withheld
    pub fn is_silenced(&self) -> bool {
        self.silenced
    }

    /// The key currently down
    pub fn current_key(&self) -> Option<KeyId> {
        self.press.as_ref().map(|p| p.key)
    }

    /// Observations of the current press so far
    pub fn down_count(&self) -> u32 {
        self.press.as_ref().map_or(0, |p| p.down_count)
    }

    pub fn timing(&self) -> KeyTiming {
        self.timing
    }

    fn arm(&mut self, now: Instant, timers: &mut TimerWheel<E>) {
        let handle = timers.schedule(now, self.timing.check_interval, self.check_event.clone());
        self.release_timer = Some(handle);
    }

    fn force_release(&mut self, timers: &mut TimerWheel<E>) {
        if let Some(handle) = self.release_timer.take() {
            timers.cancel(handle);
        }
        self.finish_press();
    }

    fn finish_press(&mut self) {
        if let Some(press) = self.press.take() {
            let phase = if press.held_emitted {
                Phase::ReleaseHeld
            } else {
                Phase::Release
            };
            self.emit(press.key, phase);
        }
        self.silenced = false;
    }

    fn emit(&self, key: KeyId, phase: Phase) {
        let code = KeyCode::new(key, phase);
        if self.silenced && phase.is_release() {
            debug!("suppressed {}", code);
            return;
        }
        debug!("key {}", code);
        let _ = self.event_tx.send(code);
    }
}
