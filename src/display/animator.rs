//! Frame-by-frame rendering of display content
//!
//! Lines too long for the display scroll left after a short hold, pause at
//! their end, then jump back to the start. Content that stays unchanged for
//! the screensaver timeout hands the display over to a screensaver until the
//! content changes or the owner removes it.

use super::content::Content;
use super::screensaver::{ScreenSaver, ScreenSaverKind};
use super::DISPLAY_HEIGHT;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How a long line advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStrategy {
    /// One character per step
    #[default]
    Crawl,
    /// A whole visible body width per step
    Page,
}

/// Animator tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatorSettings {
    /// Renders to wait before scrolling starts
    pub hold_count: u32,
    pub scroll: ScrollStrategy,
    pub screensaver: ScreenSaverKind,
    /// Unchanged time before the screensaver starts
    pub screensaver_timeout: Duration,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            hold_count: 10,
            scroll: ScrollStrategy::Crawl,
            screensaver: ScreenSaverKind::Blank,
            screensaver_timeout: Duration::from_secs(120),
        }
    }
}

/// Stateful renderer for one display
pub struct Animator {
    settings: AnimatorSettings,
    content: Option<Content>,
    offsets: [usize; DISPLAY_HEIGHT],
    shifts_needed: [usize; DISPLAY_HEIGHT],
    max_shift: usize,
    hold_counter: i64,
    at_end: bool,
    /// Last frame rendered from content
    output: [String; DISPLAY_HEIGHT],
    screensaver: Option<ScreenSaver>,
    /// When the screensaver countdown last restarted
    idle_since: Instant,
    rng: StdRng,
}

impl Animator {
    pub fn new(settings: AnimatorSettings, now: Instant) -> Self {
        Self::with_rng(settings, now, StdRng::from_os_rng())
    }

    /// Animator with a seeded screensaver generator
    pub fn with_seed(settings: AnimatorSettings, now: Instant, seed: u64) -> Self {
        Self::with_rng(settings, now, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: AnimatorSettings, now: Instant, rng: StdRng) -> Self {
        Self {
            settings,
            content: None,
            offsets: [0; DISPLAY_HEIGHT],
            shifts_needed: [0; DISPLAY_HEIGHT],
            max_shift: 0,
            hold_counter: settings.hold_count as i64,
            at_end: false,
            output: Content::blank().render(&[0; DISPLAY_HEIGHT]),
            screensaver: None,
            idle_since: now,
            rng,
        }
    }

    pub fn settings(&self) -> &AnimatorSettings {
        &self.settings
    }

    /// Hand over the content for the next frame
    pub fn set_content(&mut self, now: Instant, content: Content) {
        let previous = self.content.as_ref();

        if content.has_different_lines(previous) || content.shifts_needed() != self.shifts_needed {
            self.reset(now);
            self.shifts_needed = content.shifts_needed();
            self.max_shift = content.max_shift();
        } else if content.has_different_overlays(previous) {
            self.remove_screensaver(now);
        } else if self.screensaver.is_none()
            && now.saturating_duration_since(self.idle_since) >= self.settings.screensaver_timeout
        {
            self.activate_screensaver();
        }

        self.content = Some(content);
    }

    /// Produce the next frame, advancing the scroll and screensaver state
    pub fn render(&mut self) -> [String; DISPLAY_HEIGHT] {
        if let Some(saver) = self.screensaver.as_mut() {
            return saver.render(&mut self.rng);
        }

        let Some(content) = self.content.as_ref() else {
            return self.output.clone();
        };
        self.output = content.render(&self.offsets);
        if self.max_shift == 0 {
            return self.output.clone();
        }

        self.hold_counter -= 1;
        if self.hold_counter > 0 {
            return self.output.clone();
        }

        let step = |index: usize| match self.settings.scroll {
            ScrollStrategy::Crawl => 1,
            ScrollStrategy::Page => content.body_width(index).max(1),
        };

        // Lines that arrive early wait for the rest before the end pause
        let mut moved = false;
        for index in 0..DISPLAY_HEIGHT {
            let needed = self.shifts_needed[index];
            if self.offsets[index] < needed {
                self.offsets[index] = (self.offsets[index] + step(index)).min(needed);
                moved = true;
            }
        }

        if !moved {
            if self.at_end {
                self.at_end = false;
                self.offsets = [0; DISPLAY_HEIGHT];
            } else {
                self.at_end = true;
            }
            self.hold_counter = (self.settings.hold_count / 2) as i64;
        }

        self.output.clone()
    }

    /// Back to the start of the content, dropping any screensaver
    pub fn reset(&mut self, now: Instant) {
        self.offsets = [0; DISPLAY_HEIGHT];
        self.at_end = false;
        self.hold_counter = self.settings.hold_count as i64;
        self.remove_screensaver(now);
    }

    pub fn activate_screensaver(&mut self) {
        debug!("screensaver {} started", self.settings.screensaver.name());
        self.screensaver = Some(ScreenSaver::new(self.settings.screensaver, &self.output));
    }

    /// Stop the screensaver and restart the inactivity countdown
    pub fn remove_screensaver(&mut self, now: Instant) {
        self.screensaver = None;
        self.idle_since = now;
    }

    /// Switch screensaver kind, restarting a running one with the new kind
    pub fn set_screensaver(&mut self, kind: ScreenSaverKind) {
        self.settings.screensaver = kind;
        if self.screensaver.is_some() {
            self.activate_screensaver();
        }
    }

    pub fn is_screensaver_active(&self) -> bool {
        self.screensaver.is_some()
    }

    pub fn offsets(&self) -> [usize; DISPLAY_HEIGHT] {
        self.offsets
    }

    /// Whether scrolling is paused with every line at its end
    pub fn is_frozen_at_end(&self) -> bool {
        self.at_end
    }
}
