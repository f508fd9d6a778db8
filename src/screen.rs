//! Sources of display content
//!
//! A client shows one main screen and, for a few seconds at a time, an
//! optional overlay screen on top of it.

use crate::display::{center_align, progress_indicator, Content, DISPLAY_WIDTH};
use crate::keys::KeyCode;
use chrono::Local;
use rand::Rng;
use std::time::{Duration, Instant};

/// What a screen did with a key action
pub enum KeyResponse {
    /// Not for this screen
    Ignored,
    /// Consumed; the display may have changed
    Handled,
    /// Consumed; show this screen instead
    Show(Box<dyn Screen>),
}

impl std::fmt::Debug for KeyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignored => f.write_str("Ignored"),
            Self::Handled => f.write_str("Handled"),
            Self::Show(screen) => write!(f, "Show({})", screen.name()),
        }
    }
}

/// Something that produces display content and reacts to keys
pub trait Screen {
    /// Name for logs
    fn name(&self) -> &str;

    /// Content for the next frame
    fn content(&mut self, now: Instant) -> Content;

    fn handle_key(&mut self, _key: KeyCode) -> KeyResponse {
        KeyResponse::Ignored
    }

    /// Overlay screens are shown temporarily over the main screen
    fn is_overlay(&self) -> bool {
        false
    }
}

/// Fixed text
#[derive(Debug, Clone)]
pub struct TextScreen {
    name: String,
    content: Content,
}

impl TextScreen {
    pub fn new(name: impl Into<String>, content: Content) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Lines centered on the display
    pub fn centered(name: impl Into<String>, lines: &[String]) -> Self {
        let lines: Vec<String> = lines
            .iter()
            .map(|line| center_align(line, DISPLAY_WIDTH))
            .collect();
        Self::new(name, Content::new(lines))
    }
}

impl Screen for TextScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn content(&mut self, _now: Instant) -> Content {
        self.content.clone()
    }
}

/// Seconds before the clock hops to a new position
const CLOCK_MOVE_INTERVAL: Duration = Duration::from_secs(8);

/// Date and time wandering around the display, shown while powered off
#[derive(Debug, Default)]
pub struct ClockScreen {
    moved_at: Option<Instant>,
    offset: usize,
    width: usize,
}

impl ClockScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn layout(&mut self, now: Instant, date: String, time: String) -> Content {
        let width = date.chars().count().max(time.chars().count());
        let due = self
            .moved_at
            .is_none_or(|at| now.saturating_duration_since(at) > CLOCK_MOVE_INTERVAL);
        if due || width != self.width {
            self.moved_at = Some(now);
            self.width = width;
            self.offset = match DISPLAY_WIDTH.checked_sub(width) {
                Some(room) if room > 0 => rand::rng().random_range(0..room),
                _ => 0,
            };
        }

        let place = |text: String| {
            let pad = self.offset + (width - text.chars().count()) / 2;
            format!("{}{}", " ".repeat(pad), text)
        };
        Content::new([place(date), place(time)])
    }
}

impl Screen for ClockScreen {
    fn name(&self) -> &str {
        "clock"
    }

    fn content(&mut self, now: Instant) -> Content {
        let wall = Local::now();
        let date = wall.format("%A %B %d, %Y").to_string();
        let time = wall.format("%X").to_string();
        self.layout(now, date, time)
    }
}

/// Cells of the volume bar, caps excluded
const VOLUME_BAR_CELLS: usize = 20;

/// Current volume as a number and a bar graph
#[derive(Debug, Clone, Copy)]
pub struct VolumeScreen {
    volume: u8,
}

impl VolumeScreen {
    /// `volume` is a percentage
    pub fn new(volume: u8) -> Self {
        Self {
            volume: volume.min(100),
        }
    }
}

impl Screen for VolumeScreen {
    fn name(&self) -> &str {
        "volume"
    }

    fn content(&mut self, _now: Instant) -> Content {
        let mut line = format!("{:3}", self.volume);
        line.push_str(&progress_indicator(
            VOLUME_BAR_CELLS,
            self.volume as f64 / 100.0,
        ));
        Content::new([
            center_align("Volume", DISPLAY_WIDTH),
            center_align(&line, DISPLAY_WIDTH),
        ])
    }

    fn is_overlay(&self) -> bool {
        true
    }
}

/// A one-line `* Name STATE *` banner
#[derive(Debug, Clone)]
pub struct StateScreen {
    name: &'static str,
    state: &'static str,
}

impl StateScreen {
    pub fn new(name: &'static str, state: &'static str) -> Self {
        Self { name, state }
    }

    pub fn toggle(name: &'static str, on: bool) -> Self {
        Self::new(name, if on { "ON" } else { "OFF" })
    }
}

impl Screen for StateScreen {
    fn name(&self) -> &str {
        self.name
    }

    fn content(&mut self, _now: Instant) -> Content {
        let banner = format!("* {} {} *", self.name, self.state);
        Content::new([center_align(&banner, DISPLAY_WIDTH)])
    }

    fn is_overlay(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfd::{VOLUME_BAR_BEGIN, VOLUME_BAR_END};

    #[test]
    fn clock_centers_both_lines_at_shared_offset() {
        let mut clock = ClockScreen::new();
        let now = Instant::now();
        let content = clock.layout(now, "Monday June 01, 2009".into(), "10:00:00".into());

        let date = content.line(0);
        let time = content.line(1);
        let date_pad = date.len() - date.trim_start().len();
        let time_pad = time.len() - time.trim_start().len();
        assert_eq!(time_pad, date_pad + (20 - 8) / 2);
        assert!(date_pad < DISPLAY_WIDTH - 20);
    }

    #[test]
    fn clock_keeps_position_within_move_interval() {
        let mut clock = ClockScreen::new();
        let t0 = Instant::now();
        let first = clock.layout(t0, "Monday June 01, 2009".into(), "10:00:00".into());
        let later = clock.layout(
            t0 + Duration::from_secs(5),
            "Monday June 01, 2009".into(),
            "10:00:05".into(),
        );
        assert_eq!(first.line(0), later.line(0));
    }

    #[test]
    fn clock_content_fits_the_display() {
        let mut clock = ClockScreen::new();
        let content = clock.content(Instant::now());
        assert!(content.line(0).chars().count() <= DISPLAY_WIDTH);
        assert_eq!(content.shifts_needed(), [0, 0]);
    }

    #[test]
    fn volume_screen_draws_bar() {
        let mut screen = VolumeScreen::new(50);
        let content = screen.content(Instant::now());
        assert!(content.line(0).trim() == "Volume");
        let bar = content.line(1).trim();
        assert!(bar.starts_with(" 50") || bar.starts_with("50"));
        assert!(bar.contains(VOLUME_BAR_BEGIN));
        assert!(bar.ends_with(VOLUME_BAR_END));
        assert!(screen.is_overlay());
    }

    #[test]
    fn volume_is_capped_at_100() {
        let mut screen = VolumeScreen::new(250);
        assert!(screen.content(Instant::now()).line(1).contains("100"));
    }

    #[test]
    fn state_banner() {
        let mut screen = StateScreen::toggle("Mute", true);
        assert_eq!(screen.content(Instant::now()).line(0).trim(), "* Mute ON *");
    }

    #[test]
    fn text_screen_ignores_keys() {
        use crate::keys::{KeyId, Phase};
        let mut screen = TextScreen::centered("hello", &["Hello".to_string()]);
        let response = screen.handle_key(KeyCode::new(KeyId::Play, Phase::First));
        assert!(matches!(response, KeyResponse::Ignored));
        assert!(!screen.is_overlay());
    }
}
