//! Translation of Unicode text into the display's native character set

use std::collections::HashMap;
use std::sync::LazyLock;

/// Device code of the block with every dot on
pub const ALL_DOTS_ON: u8 = 0xFF;

/// Latin-1 and other points with a native (or close) equivalent on the
/// non-Japanese character ROM
const NATIVE_CODES: &[(char, u8)] = &[
    ('\u{00A0}', 0x20), // no-break space
    ('\u{00A5}', 250),  // yen sign
    ('\u{00A6}', 124),  // broken bar
    ('\u{00AB}', 34),   // left angle quotes
    ('\u{00AD}', 45),   // soft hyphen
    ('\u{00B0}', 0xDF), // degree sign
    ('\u{00B4}', 219),  // spacing acute
    ('\u{00B5}', 0xE4), // micro sign
    ('\u{00B7}', 0xA5), // middle dot
    ('\u{00BB}', 34),   // right angle quotes
    ('\u{00BF}', 235),  // inverted question mark
    ('\u{00C0}', 180),
    ('\u{00C1}', 179),
    ('\u{00C2}', 211),
    ('\u{00C3}', 178),
    ('\u{00C4}', 241),
    ('\u{00C5}', 209),
    ('\u{00C6}', 206),
    ('\u{00C7}', 201),
    ('\u{00C8}', 184),
    ('\u{00C9}', 183),
    ('\u{00CA}', 214),
    ('\u{00CB}', 247),
    ('\u{00CC}', 240),
    ('\u{00CD}', 176),
    ('\u{00CE}', 208),
    ('\u{00CF}', 177),
    ('\u{00D0}', 203), // ETH
    ('\u{00D1}', 222),
    ('\u{00D2}', 175),
    ('\u{00D3}', 191),
    ('\u{00D4}', 223),
    ('\u{00D5}', 207),
    ('\u{00D6}', 239),
    ('\u{00D7}', 120), // multiplication sign
    ('\u{00D8}', 189),
    ('\u{00D9}', 182),
    ('\u{00DA}', 181),
    ('\u{00DB}', 244),
    ('\u{00DC}', 229),
    ('\u{00DD}', 188),
    ('\u{00DE}', 251), // THORN
    ('\u{00DF}', 226), // sharp s
    ('\u{00E0}', 164),
    ('\u{00E1}', 163),
    ('\u{00E2}', 195),
    ('\u{00E3}', 162),
    ('\u{00E4}', 225),
    ('\u{00E5}', 193),
    ('\u{00E6}', 190),
    ('\u{00E7}', 201),
    ('\u{00E8}', 168),
    ('\u{00E9}', 167),
    ('\u{00EA}', 198),
    ('\u{00EB}', 231),
    ('\u{00EC}', 224),
    ('\u{00ED}', 160),
    ('\u{00EE}', 192),
    ('\u{00EF}', 161),
    ('\u{00F0}', 187), // eth
    ('\u{00F1}', 238),
    ('\u{00F2}', 175),
    ('\u{00F3}', 191),
    ('\u{00F4}', 223),
    ('\u{00F5}', 207),
    ('\u{00F6}', 239),
    ('\u{00F7}', 47), // division sign
    ('\u{00F8}', 189),
    ('\u{00F9}', 166),
    ('\u{00FA}', 165),
    ('\u{00FB}', 228),
    ('\u{00FC}', 245),
    ('\u{00FD}', 172),
    ('\u{00FE}', 251), // thorn
    ('\u{00FF}', 204),
    ('\u{2588}', ALL_DOTS_ON), // full block
];

static NATIVE_MAP: LazyLock<HashMap<char, u8>> =
    LazyLock::new(|| NATIVE_CODES.iter().copied().collect());

/// Native device code for `ch`, if the character ROM has one
pub fn native_code(ch: char) -> Option<u8> {
    if (' '..='~').contains(&ch) {
        return Some(ch as u8);
    }
    NATIVE_MAP.get(&ch).copied()
}
