//! Screensavers shown after a period without display changes

use super::DISPLAY_HEIGHT;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character cells of a frame, one row per line
pub type Grid = [Vec<char>; DISPLAY_HEIGHT];

/// Available screensaver effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenSaverKind {
    /// Blank display
    #[default]
    Blank,
    /// Randomly blank a character, or restore it if already blank
    Zap,
    /// Randomly swap two characters
    Swap,
    /// Rotate every line left, each line faster than the one above
    RotateLeft,
}

impl ScreenSaverKind {
    pub const ALL: [ScreenSaverKind; 4] = [Self::Blank, Self::RotateLeft, Self::Swap, Self::Zap];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Zap => "zap",
            Self::Swap => "swap",
            Self::RotateLeft => "rotate_left",
        }
    }

    /// Human readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Blank => "Blank Display",
            Self::Zap => "Zap Characters",
            Self::Swap => "Swap Characters",
            Self::RotateLeft => "Rotate Left",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ScreenSaverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Random cell as (row, column); `None` for an empty grid
fn random_cell(grid: &Grid, rng: &mut impl Rng) -> Option<(usize, usize)> {
    let width = grid.iter().map(Vec::len).min().unwrap_or(0);
    if width == 0 {
        return None;
    }
    let value = rng.random_range(0..DISPLAY_HEIGHT * width);
    Some((value / width, value % width))
}

/// Next screensaver frame from the current one.
///
/// `original` is the frame that was on screen when the screensaver started.
pub fn advance(kind: ScreenSaverKind, original: &Grid, current: &Grid, rng: &mut impl Rng) -> Grid {
    let mut next = current.clone();
    match kind {
        ScreenSaverKind::Blank => {
            for row in &mut next {
                row.fill(' ');
            }
        }
        ScreenSaverKind::Zap => {
            if let Some((y, x)) = random_cell(&next, rng) {
                next[y][x] = if next[y][x] == ' ' {
                    original[y].get(x).copied().unwrap_or(' ')
                } else {
                    ' '
                };
            }
        }
        ScreenSaverKind::Swap => {
            if let (Some((y1, x1)), Some((y2, x2))) =
                (random_cell(&next, rng), random_cell(&next, rng))
            {
                let value = next[y1][x1];
                next[y1][x1] = next[y2][x2];
                next[y2][x2] = value;
            }
        }
        ScreenSaverKind::RotateLeft => {
            for (index, row) in next.iter_mut().enumerate() {
                if !row.is_empty() {
                    let by = (index + 1) % row.len();
                    row.rotate_left(by);
                }
            }
        }
    }
    next
}

/// A running screensaver
#[derive(Debug, Clone)]
pub struct ScreenSaver {
    kind: ScreenSaverKind,
    original: Grid,
    display: Grid,
}

impl ScreenSaver {
    /// Start `kind` over the frame last shown
    pub fn new(kind: ScreenSaverKind, lines: &[String; DISPLAY_HEIGHT]) -> Self {
        let original: Grid = std::array::from_fn(|i| lines[i].chars().collect());
        let original = match kind {
            ScreenSaverKind::Blank => original.map(|row| vec![' '; row.len()]),
            _ => original,
        };
        Self {
            kind,
            display: original.clone(),
            original,
        }
    }

    pub fn kind(&self) -> ScreenSaverKind {
        self.kind
    }

    /// Advance one step and return the frame to show
    pub fn render(&mut self, rng: &mut impl Rng) -> [String; DISPLAY_HEIGHT] {
        self.display = advance(self.kind, &self.original, &self.display, rng);
        std::array::from_fn(|i| self.display[i].iter().collect())
    }
}
