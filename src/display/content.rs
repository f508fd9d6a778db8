//! One frame of display content

use crate::vfd::glyphs::{volume_bar, VOLUME_BAR_BEGIN, VOLUME_BAR_END, VOLUME_BAR_STEPS};

/// Characters per display line
pub const DISPLAY_WIDTH: usize = 40;
/// Lines on the display
pub const DISPLAY_HEIGHT: usize = 2;

/// First characters that need no separator space in front of an overlay
const NO_SPACE_PREFIX: [char; 2] = [' ', VOLUME_BAR_BEGIN];

/// Two lines of text with optional right overlays and cursor.
///
/// The body of a line may be longer than the display and is then scrolled by
/// the animator. An overlay is pinned to the right end of its line and always
/// wins over the body text beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    lines: [String; DISPLAY_HEIGHT],
    overlays: [String; DISPLAY_HEIGHT],
    cursor: Option<usize>,
    width: usize,
    shifts_needed: [usize; DISPLAY_HEIGHT],
}

impl Content {
    /// Content from up to two lines; missing lines are empty, extra are ignored
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut content = Self {
            lines: normalize(lines),
            overlays: Default::default(),
            cursor: None,
            width: DISPLAY_WIDTH,
            shifts_needed: [0; DISPLAY_HEIGHT],
        };
        content.update_shifts();
        content
    }

    /// Nothing shown
    pub fn blank() -> Self {
        Self::new([""; 0])
    }

    /// Attach right overlays. A non-empty overlay gains a separator space in
    /// front unless it already starts with a non-spacing character.
    pub fn with_overlays<I, S>(mut self, overlays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overlays = normalize(overlays);
        for overlay in &mut self.overlays {
            if let Some(first) = overlay.chars().next() {
                if !NO_SPACE_PREFIX.contains(&first) {
                    overlay.insert(0, ' ');
                }
            }
        }
        self.update_shifts();
        self
    }

    pub fn with_cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self.update_shifts();
        self
    }

    pub fn line(&self, index: usize) -> &str {
        &self.lines[index]
    }

    /// Overlay of a line after normalization
    pub fn overlay(&self, index: usize) -> &str {
        &self.overlays[index]
    }

    pub fn lines(&self) -> &[String; DISPLAY_HEIGHT] {
        &self.lines
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Per line, how far the body must scroll to reveal its last character
    pub fn shifts_needed(&self) -> [usize; DISPLAY_HEIGHT] {
        self.shifts_needed
    }

    pub fn max_shift(&self) -> usize {
        self.shifts_needed.iter().copied().max().unwrap_or(0)
    }

    /// Cells of a line left to the body once its overlay is drawn
    pub fn body_width(&self, index: usize) -> usize {
        self.width.saturating_sub(self.overlay_len(index))
    }

    /// Render both lines at the given scroll offsets.
    ///
    /// Each output line is exactly `width` characters.
    pub fn render(&self, offsets: &[usize; DISPLAY_HEIGHT]) -> [String; DISPLAY_HEIGHT] {
        std::array::from_fn(|index| {
            let overlay_len = self.overlay_len(index);
            let body_len = self.width - overlay_len;

            let mut line: String = self.lines[index]
                .chars()
                .skip(offsets[index])
                .chain(std::iter::repeat(' '))
                .take(body_len)
                .collect();
            line.extend(self.overlays[index].chars().take(overlay_len));
            line
        })
    }

    /// Whether the body lines differ from `other`; `None` always differs
    pub fn has_different_lines(&self, other: Option<&Content>) -> bool {
        other.is_none_or(|other| self.lines != other.lines)
    }

    /// Whether the overlays differ from `other`; `None` always differs
    pub fn has_different_overlays(&self, other: Option<&Content>) -> bool {
        other.is_none_or(|other| self.overlays != other.overlays)
    }

    /// Overlay cells actually drawn, never more than the width
    fn overlay_len(&self, index: usize) -> usize {
        self.overlays[index].chars().count().min(self.width)
    }

    fn update_shifts(&mut self) {
        for index in 0..DISPLAY_HEIGHT {
            let len = self.lines[index].chars().count();
            self.shifts_needed[index] = len.saturating_sub(self.body_width(index));
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::blank()
    }
}

fn normalize<I, S>(values: I) -> [String; DISPLAY_HEIGHT]
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: [String; DISPLAY_HEIGHT] = Default::default();
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value.into();
    }
    out
}

/// Pad `value` on the left so it sits centered in `width` cells
pub fn center_align(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), value)
}

/// Pad `value` on the left so it ends at the last of `width` cells
pub fn right_align(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    format!("{}{}", " ".repeat(width - len), value)
}

/// Bar graph of `fraction` (clamped to 0..=1) drawn in `width` cells between
/// two end caps, so the result is `width + 2` characters.
pub fn progress_indicator(width: usize, fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let lit = (width as f64 * VOLUME_BAR_STEPS as f64 * fraction) as usize;
    let full = lit / VOLUME_BAR_STEPS;
    let partial = lit % VOLUME_BAR_STEPS;
    let mut empty = width - full;

    let mut out = String::with_capacity((width + 2) * 3);
    out.push(VOLUME_BAR_BEGIN);
    out.extend(std::iter::repeat_n(volume_bar(VOLUME_BAR_STEPS), full));
    if partial > 0 {
        out.push(volume_bar(partial));
        empty -= 1;
    }
    out.extend(std::iter::repeat_n(volume_bar(0), empty));
    out.push(VOLUME_BAR_END);
    out
}
