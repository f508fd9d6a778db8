//! Per-terminal state
//!
//! A [`Client`] ties the key classifier, the animator and the display encoder
//! of one terminal together and decides which screen is on the display.

use crate::display::{Animator, AnimatorSettings};
use crate::keys::{KeyClassifier, KeyCode, KeyId, KeyTiming, Phase, RawKeyEvent};
use crate::screen::{ClockScreen, KeyResponse, Screen, StateScreen, VolumeScreen};
use crate::timer::{TimerHandle, TimerWheel};
use crate::vfd::Vfd;
use log::debug;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Timers a client owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientTimer {
    /// Key classifier release check
    ReleaseCheck,
    /// Periodic display update
    Refresh,
    /// Overlay screen has been up long enough
    OverlayExpired,
}

/// Everything the server schedules on its timer wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Client { addr: SocketAddr, kind: ClientTimer },
    /// Look for terminals that went quiet
    StaleSweep,
}

impl TimerEvent {
    /// Whether this event belongs to the client at `addr`
    pub fn is_for(&self, addr: SocketAddr) -> bool {
        matches!(self, Self::Client { addr: a, .. } if *a == addr)
    }
}

/// Which tracks play again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    Song,
}

impl RepeatMode {
    /// The mode the repeat key moves to
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::Song,
            Self::Song => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::All => "ALL",
            Self::Song => "SONG",
        }
    }
}

/// Tunables shared by every client
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub key_timing: KeyTiming,
    pub animator: AnimatorSettings,
    pub refresh_interval: Duration,
    pub overlay_duration: Duration,
    /// Silence after which a terminal is considered gone
    pub stale_after: Duration,
    pub brightness: u8,
    /// Volume change per volume key action, in percent
    pub volume_step: u8,
    pub start_powered_on: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            key_timing: KeyTiming::default(),
            animator: AnimatorSettings::default(),
            refresh_interval: Duration::from_millis(250),
            overlay_duration: Duration::from_secs(3),
            stale_after: Duration::from_secs(60),
            brightness: crate::vfd::MAX_BRIGHTNESS,
            volume_step: 5,
            start_powered_on: false,
        }
    }
}

/// One terminal
pub struct Client {
    addr: SocketAddr,
    settings: ClientSettings,
    classifier: KeyClassifier<TimerEvent>,
    actions: mpsc::Receiver<KeyCode>,
    animator: Animator,
    vfd: Vfd,
    screen: Box<dyn Screen>,
    /// Main screen kept aside while the clock shows
    parked: Option<Box<dyn Screen>>,
    powered_on: bool,
    overlay: Option<Box<dyn Screen>>,
    overlay_timer: Option<TimerHandle>,
    refresh_timer: Option<TimerHandle>,
    last_message: Instant,
    last_key: Option<Instant>,
    volume: u8,
    muted: bool,
    shuffle: bool,
    repeat: RepeatMode,
    needs_refresh: bool,
}

impl Client {
    /// New client whose powered-on screen is `main_screen`
    pub fn new(
        addr: SocketAddr,
        settings: ClientSettings,
        main_screen: Box<dyn Screen>,
        now: Instant,
    ) -> Self {
        Self::with_animator(
            addr,
            settings.clone(),
            main_screen,
            now,
            Animator::new(settings.animator, now),
        )
    }

    /// Like [`Client::new`] with a caller supplied animator
    pub fn with_animator(
        addr: SocketAddr,
        settings: ClientSettings,
        main_screen: Box<dyn Screen>,
        now: Instant,
        animator: Animator,
    ) -> Self {
        let (tx, actions) = mpsc::channel();
        let check = TimerEvent::Client {
            addr,
            kind: ClientTimer::ReleaseCheck,
        };
        let powered_on = settings.start_powered_on;
        let (screen, parked): (Box<dyn Screen>, _) = if powered_on {
            (main_screen, None)
        } else {
            (Box::new(ClockScreen::new()), Some(main_screen))
        };

        Self {
            addr,
            classifier: KeyClassifier::new(settings.key_timing, check, tx),
            actions,
            animator,
            vfd: Vfd::new(settings.brightness),
            screen,
            parked,
            powered_on,
            overlay: None,
            overlay_timer: None,
            refresh_timer: None,
            last_message: now,
            last_key: None,
            volume: 50,
            muted: false,
            shuffle: false,
            repeat: RepeatMode::Off,
            needs_refresh: false,
            settings,
        }
    }

    /// Start the refresh cycle and ask for a first frame
    pub fn start(&mut self, now: Instant, timers: &mut TimerWheel<TimerEvent>) {
        self.schedule_refresh(now, timers);
        self.needs_refresh = true;
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Record that the terminal is alive
    pub fn touch(&mut self, now: Instant) {
        self.last_message = now;
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_message) > self.settings.stale_after
    }

    /// Feed one "button is down" report.
    ///
    /// A key press while the screensaver runs only dismisses it.
    pub fn process_key(&mut self, event: RawKeyEvent, timers: &mut TimerWheel<TimerEvent>) {
        let now = event.received;
        self.last_key = Some(now);

        if self.animator.is_screensaver_active() {
            debug!("{}: {} dismisses screensaver", self.addr, event.key);
            self.animator.remove_screensaver(now);
            self.needs_refresh = true;
            return;
        }

        self.classifier.observe(now, event.key, timers);
        self.drain_actions(now, timers);
    }

    /// React to one of this client's timers firing
    pub fn handle_timer(
        &mut self,
        now: Instant,
        kind: ClientTimer,
        timers: &mut TimerWheel<TimerEvent>,
    ) {
        match kind {
            ClientTimer::ReleaseCheck => {
                self.classifier.check_release(now, timers);
                self.drain_actions(now, timers);
            }
            ClientTimer::Refresh => {
                self.refresh_timer = None;
                self.needs_refresh = true;
                self.schedule_refresh(now, timers);
            }
            ClientTimer::OverlayExpired => {
                self.overlay_timer = None;
                self.clear_overlay(timers);
            }
        }
    }

    /// Encode the next display frame
    pub fn frame(&mut self, now: Instant) -> Vec<u8> {
        let screen = match self.overlay.as_mut() {
            Some(overlay) => overlay,
            None => &mut self.screen,
        };
        let content = screen.content(now);
        let cursor = content.cursor();

        self.animator.set_content(now, content);
        let lines = self.animator.render();
        self.vfd.build(&lines, cursor)
    }

    /// Whether a frame should be sent now; clears the request
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_refresh)
    }

    /// Drop the overlay screen, if any
    pub fn clear_overlay(&mut self, timers: &mut TimerWheel<TimerEvent>) {
        if self.overlay.take().is_none() {
            return;
        }
        self.classifier.reset();
        if let Some(handle) = self.overlay_timer.take() {
            timers.cancel(handle);
        }
        self.needs_refresh = true;
    }

    /// Stop everything this client has pending
    pub fn close(&mut self, timers: &mut TimerWheel<TimerEvent>) {
        self.classifier.clear(timers);
        for handle in [self.refresh_timer.take(), self.overlay_timer.take()]
            .into_iter()
            .flatten()
        {
            timers.cancel(handle);
        }
    }

    pub fn brightness(&self) -> u8 {
        self.vfd.brightness()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_shuffling(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn is_powered_on(&self) -> bool {
        self.powered_on
    }

    pub fn screen_name(&self) -> &str {
        self.screen.name()
    }

    pub fn overlay_name(&self) -> Option<&str> {
        self.overlay.as_ref().map(|o| o.name())
    }

    pub fn last_key(&self) -> Option<Instant> {
        self.last_key
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    fn schedule_refresh(&mut self, now: Instant, timers: &mut TimerWheel<TimerEvent>) {
        if let Some(handle) = self.refresh_timer.take() {
            timers.cancel(handle);
        }
        let event = TimerEvent::Client {
            addr: self.addr,
            kind: ClientTimer::Refresh,
        };
        self.refresh_timer = Some(timers.schedule(now, self.settings.refresh_interval, event));
    }

    fn drain_actions(&mut self, now: Instant, timers: &mut TimerWheel<TimerEvent>) {
        while let Ok(code) = self.actions.try_recv() {
            self.handle_action(now, code, timers);
        }
    }

    /// The visible screen gets the first chance at an action; what it
    /// ignores goes to the global keymap.
    fn handle_action(&mut self, now: Instant, code: KeyCode, timers: &mut TimerWheel<TimerEvent>) {
        let target = match self.overlay.as_mut() {
            Some(overlay) => overlay,
            None => &mut self.screen,
        };

        match target.handle_key(code) {
            KeyResponse::Show(screen) if screen.is_overlay() => {
                self.show_overlay(now, screen, timers);
            }
            KeyResponse::Show(screen) => self.show_screen(screen, timers),
            KeyResponse::Handled => self.needs_refresh = true,
            KeyResponse::Ignored => self.handle_global(now, code, timers),
        }
    }

    fn handle_global(&mut self, now: Instant, code: KeyCode, timers: &mut TimerWheel<TimerEvent>) {
        const PRESS_OR_REPEAT: &[Phase] = &[Phase::First, Phase::Repeat];
        let step = self.settings.volume_step as i32;

        if code.is(KeyId::ChannelUp, PRESS_OR_REPEAT) {
            self.vfd.change_brightness(1);
            self.needs_refresh = true;
        } else if code.is(KeyId::ChannelDown, PRESS_OR_REPEAT) {
            self.vfd.change_brightness(-1);
            self.needs_refresh = true;
        } else if code.is(KeyId::VolumeUp, PRESS_OR_REPEAT) {
            self.change_volume(now, step, timers);
        } else if code.is(KeyId::VolumeDown, PRESS_OR_REPEAT) {
            self.change_volume(now, -step, timers);
        } else if code.is(KeyId::Mute, &[Phase::First]) {
            self.muted = !self.muted;
            self.show_overlay(now, Box::new(StateScreen::toggle("Mute", self.muted)), timers);
        } else if code.is(KeyId::Shuffle, &[Phase::First]) {
            self.shuffle = !self.shuffle;
            let banner = StateScreen::toggle("Shuffling", self.shuffle);
            self.show_overlay(now, Box::new(banner), timers);
        } else if code.is(KeyId::Repeat, &[Phase::First]) {
            self.repeat = self.repeat.next();
            let banner = StateScreen::new("Repeat", self.repeat.label());
            self.show_overlay(now, Box::new(banner), timers);
        } else if code.is(KeyId::Power, &[Phase::First]) {
            self.toggle_power(timers);
        } else {
            debug!("{}: {} unhandled", self.addr, code);
        }
    }

    fn change_volume(&mut self, now: Instant, delta: i32, timers: &mut TimerWheel<TimerEvent>) {
        self.volume = (self.volume as i32 + delta).clamp(0, 100) as u8;
        self.show_overlay(now, Box::new(VolumeScreen::new(self.volume)), timers);
    }

    fn toggle_power(&mut self, timers: &mut TimerWheel<TimerEvent>) {
        if self.powered_on {
            let main = std::mem::replace(&mut self.screen, Box::new(ClockScreen::new()));
            self.parked = Some(main);
            self.powered_on = false;
            self.classifier.reset();
            self.drop_overlay(timers);
            self.needs_refresh = true;
        } else if let Some(main) = self.parked.take() {
            self.powered_on = true;
            self.show_screen(main, timers);
        }
    }

    fn show_screen(&mut self, screen: Box<dyn Screen>, timers: &mut TimerWheel<TimerEvent>) {
        debug!("{}: screen {}", self.addr, screen.name());
        self.classifier.reset();
        self.screen = screen;
        self.drop_overlay(timers);
        self.needs_refresh = true;
    }

    /// Show `screen` over the main one, restarting the expiry timer
    fn show_overlay(
        &mut self,
        now: Instant,
        screen: Box<dyn Screen>,
        timers: &mut TimerWheel<TimerEvent>,
    ) {
        if self.overlay.is_none() {
            self.classifier.reset();
        }
        self.overlay = Some(screen);
        if let Some(handle) = self.overlay_timer.take() {
            timers.cancel(handle);
        }
        let event = TimerEvent::Client {
            addr: self.addr,
            kind: ClientTimer::OverlayExpired,
        };
        self.overlay_timer = Some(timers.schedule(now, self.settings.overlay_duration, event));
        self.needs_refresh = true;
    }

    fn drop_overlay(&mut self, timers: &mut TimerWheel<TimerEvent>) {
        self.overlay = None;
        if let Some(handle) = self.overlay_timer.take() {
            timers.cancel(handle);
        }
    }
}
