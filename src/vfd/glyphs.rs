//! Bitmaps for characters the display can only show through a custom slot
//!
//! The display has a handful of programmable 5x7 character cells with an
//! optional underline row. Accented letters missing from the native set are
//! composed from a two-row accent on top of a five-row lowercase letter.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Left cap of the volume bar
pub const VOLUME_BAR_BEGIN: char = '\u{E000}';
/// Right cap of the volume bar
pub const VOLUME_BAR_END: char = '\u{E007}';
/// Horizontal ellipsis
pub const ELLIPSIS: char = '\u{2026}';
/// Dotted vertical separator
pub const DOTTED_VERTICAL_BAR: char = '\u{250A}';

/// Number of dot columns lit per volume bar cell when full
pub const VOLUME_BAR_STEPS: usize = 5;

/// Volume bar cell with `lit` of its five columns lit, left to right
pub fn volume_bar(lit: usize) -> char {
    let lit = lit.min(VOLUME_BAR_STEPS) as u32;
    char::from_u32(0xE001 + lit).unwrap_or(VOLUME_BAR_BEGIN)
}

/// A programmable character bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Dot rows top to bottom, low 5 bits used, MSB is the leftmost column
    pub rows: [u8; 7],
    /// Whether the eighth (cursor) row is lit
    pub underline: bool,
}

impl Glyph {
    pub const fn new(rows: [u8; 7], underline: bool) -> Self {
        Self { rows, underline }
    }

    /// The eight definition bytes sent to the display
    pub fn definition(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        for (dst, row) in bytes.iter_mut().zip(self.rows) {
            *dst = row & 0x1F;
        }
        bytes[7] = if self.underline { 0x1F } else { 0x00 };
        bytes
    }
}

// Five-row lowercase letters, placed under a two-row accent
const LETTER_A: [u8; 5] = [0b01110, 0b00001, 0b01111, 0b10001, 0b01111];
const LETTER_C: [u8; 5] = [0b01110, 0b10000, 0b10000, 0b10001, 0b01110];
const LETTER_E: [u8; 5] = [0b01110, 0b10001, 0b11111, 0b10000, 0b01110];
const LETTER_I: [u8; 5] = [0b01100, 0b00100, 0b00100, 0b00100, 0b01110];
const LETTER_N: [u8; 5] = [0b10110, 0b11001, 0b10001, 0b10001, 0b10001];
const LETTER_O: [u8; 5] = [0b01110, 0b10001, 0b10001, 0b10001, 0b01110];
const LETTER_R: [u8; 5] = [0b10110, 0b11001, 0b10000, 0b10000, 0b10000];
const LETTER_S: [u8; 5] = [0b01111, 0b10000, 0b01110, 0b00001, 0b11110];
const LETTER_U: [u8; 5] = [0b10001, 0b10001, 0b10001, 0b10011, 0b01101];
const LETTER_Z: [u8; 5] = [0b11111, 0b00010, 0b00100, 0b01000, 0b11111];

struct Accent {
    rows: [u8; 2],
    letters: &'static [(char, [u8; 5])],
}

const ACCENTS: &[Accent] = &[
    // caron
    Accent {
        rows: [0b01010, 0b00100],
        letters: &[
            ('\u{010D}', LETTER_C),
            ('\u{011B}', LETTER_E),
            ('\u{0148}', LETTER_N),
            ('\u{0159}', LETTER_R),
            ('\u{0161}', LETTER_S),
            ('\u{017E}', LETTER_Z),
        ],
    },
    // macron
    Accent {
        rows: [0b01110, 0b00000],
        letters: &[
            ('\u{0101}', LETTER_A),
            ('\u{0113}', LETTER_E),
            ('\u{012B}', LETTER_I),
            ('\u{014D}', LETTER_O),
            ('\u{016B}', LETTER_U),
        ],
    },
    // breve
    Accent {
        rows: [0b10001, 0b01110],
        letters: &[
            ('\u{0103}', LETTER_A),
            ('\u{0115}', LETTER_E),
            ('\u{012D}', LETTER_I),
            ('\u{014F}', LETTER_O),
            ('\u{016D}', LETTER_U),
        ],
    },
    // dot above
    Accent {
        rows: [0b00100, 0b00000],
        letters: &[
            ('\u{010B}', LETTER_C),
            ('\u{0117}', LETTER_E),
            ('\u{017C}', LETTER_Z),
        ],
    },
    // double acute
    Accent {
        rows: [0b01001, 0b10010],
        letters: &[('\u{0151}', LETTER_O), ('\u{0171}', LETTER_U)],
    },
    // acute
    Accent {
        rows: [0b00010, 0b00100],
        letters: &[
            ('\u{0107}', LETTER_C),
            ('\u{0144}', LETTER_N),
            ('\u{0155}', LETTER_R),
            ('\u{015B}', LETTER_S),
            ('\u{017A}', LETTER_Z),
        ],
    },
];

/// Every character drawable through a custom slot
pub static CUSTOM_GLYPHS: LazyLock<HashMap<char, Glyph>> = LazyLock::new(|| {
    let mut glyphs = HashMap::new();

    for accent in ACCENTS {
        for &(ch, letter) in accent.letters {
            let mut rows = [0u8; 7];
            rows[..2].copy_from_slice(&accent.rows);
            rows[2..].copy_from_slice(&letter);
            glyphs.insert(ch, Glyph::new(rows, false));
        }
    }

    // Volume bar cells: closed top edge, underline as the bottom edge
    for lit in 0..=VOLUME_BAR_STEPS {
        let fill = (0x1F_u8 << (VOLUME_BAR_STEPS - lit)) & 0x1F;
        let mut rows = [fill; 7];
        rows[0] = 0x1F;
        glyphs.insert(volume_bar(lit), Glyph::new(rows, true));
    }
    glyphs.insert(VOLUME_BAR_BEGIN, Glyph::new([0b00001; 7], false));
    glyphs.insert(VOLUME_BAR_END, Glyph::new([0b10000; 7], false));

    glyphs.insert(ELLIPSIS, Glyph::new([0, 0, 0, 0, 0, 0, 0b10101], false));
    glyphs.insert(
        DOTTED_VERTICAL_BAR,
        Glyph::new([0b00100, 0, 0b00100, 0, 0b00100, 0, 0b00100], false),
    );

    glyphs
});

/// Bitmap for `ch` if it can be drawn through a custom slot
pub fn custom_glyph(ch: char) -> Option<&'static Glyph> {
    CUSTOM_GLYPHS.get(&ch)
}
