//! Builder for the display update (`l`) message

use super::charset::{native_code, ALL_DOTS_ON};
use super::glyphs::{custom_glyph, Glyph};
use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

pub const MIN_BRIGHTNESS: u8 = 0;
pub const MAX_BRIGHTNESS: u8 = 3;

/// Programmable character slots available per frame
pub const CUSTOM_SLOTS: usize = 8;

/// Length of the message header, tag included
pub const HEADER_LEN: usize = 18;

const COMMAND_PREFIX: u8 = 0x02;
const DATA_PREFIX: u8 = 0x03;

const CMD_FUNCTION_SET_RESET: u8 = 0x33;
const CMD_BRIGHTNESS_FULL: u8 = 0x00;
const CMD_FUNCTION_SET: u8 = 0x30;
const CMD_DEFINE_GLYPH: u8 = 0x40;
const CMD_ENTRY_MODE: u8 = 0x06;
const CMD_CLEAR_HOME: u8 = 0x03;
const CMD_LINE_ONE: u8 = 0x80;
const CMD_LINE_TWO: u8 = 0xC0;
const CMD_CURSOR_OFF: u8 = 0x0C;
const CMD_CURSOR_ON: u8 = 0x0E;

/// Custom slots handed out while encoding one frame
#[derive(Debug, Default)]
struct SlotTable {
    slots: Vec<(char, &'static Glyph)>,
}

impl SlotTable {
    /// Device code for `ch`, allocating a slot on first sight of a custom glyph
    fn code_for(&mut self, ch: char) -> u8 {
        if let Some(code) = native_code(ch) {
            return code;
        }
        if let Some(slot) = self.slots.iter().position(|(c, _)| *c == ch) {
            return slot as u8;
        }
        match custom_glyph(ch) {
            Some(glyph) if self.slots.len() < CUSTOM_SLOTS => {
                self.slots.push((ch, glyph));
                (self.slots.len() - 1) as u8
            }
            _ => ALL_DOTS_ON,
        }
    }
}

struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    fn new() -> Self {
        // Two bytes per command or character: setup, glyphs, 80 cells, cursor
        let mut bytes = Vec::with_capacity(HEADER_LEN + 2 * (16 + CUSTOM_SLOTS * 9 + 80));
        bytes.push(b'l');
        bytes.extend_from_slice(&[b' '; HEADER_LEN - 1]);
        Self { bytes }
    }

    fn command(&mut self, opcode: u8) {
        self.bytes.extend_from_slice(&[COMMAND_PREFIX, opcode]);
    }

    fn data(&mut self, value: u8) {
        self.bytes.extend_from_slice(&[DATA_PREFIX, value]);
    }
}

/// Encode two rendered lines into a display update message.
///
/// Lines are padded or cut to the display width. `cursor` is a cell index
/// across both lines, values outside `0..80` hide the cursor. Brightness 0
/// blanks every cell while the command sequence stays intact.
pub fn encode(lines: &[String; DISPLAY_HEIGHT], brightness: u8, cursor: Option<usize>) -> Vec<u8> {
    let brightness = brightness.min(MAX_BRIGHTNESS);

    // Scan both lines once so glyph definitions can precede the text
    let mut slots = SlotTable::default();
    let mut codes = [[b' '; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    if brightness > MIN_BRIGHTNESS {
        for (row, line) in codes.iter_mut().zip(lines) {
            for (cell, ch) in row.iter_mut().zip(line.chars()) {
                *cell = slots.code_for(ch);
            }
        }
    }

    let mut frame = Frame::new();
    frame.command(CMD_FUNCTION_SET_RESET);
    frame.command(CMD_BRIGHTNESS_FULL);
    frame.command(CMD_FUNCTION_SET);
    frame.data(MAX_BRIGHTNESS - brightness);

    for (slot, (_, glyph)) in slots.slots.iter().enumerate() {
        frame.command(CMD_DEFINE_GLYPH + (slot as u8) * 8);
        for row in glyph.definition() {
            frame.data(row);
        }
    }

    frame.command(CMD_ENTRY_MODE);
    frame.command(CMD_CLEAR_HOME);

    for code in codes[0] {
        frame.data(code);
    }
    frame.command(CMD_LINE_TWO);
    for code in codes[1] {
        frame.data(code);
    }

    match cursor.filter(|c| *c < DISPLAY_WIDTH * DISPLAY_HEIGHT) {
        None => frame.command(CMD_CURSOR_OFF),
        Some(col) => {
            if col < DISPLAY_WIDTH {
                frame.command(CMD_LINE_ONE + col as u8);
            } else {
                frame.command(CMD_LINE_TWO + (col - DISPLAY_WIDTH) as u8);
            }
            frame.command(CMD_CURSOR_ON);
        }
    }

    frame.bytes
}

/// Display brightness and message building for one terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vfd {
    brightness: u8,
}

impl Vfd {
    pub fn new(brightness: u8) -> Self {
        Self {
            brightness: brightness.min(MAX_BRIGHTNESS),
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Set the brightness, clamped to the supported range
    pub fn set_brightness(&mut self, value: i32) {
        self.brightness = value.clamp(MIN_BRIGHTNESS as i32, MAX_BRIGHTNESS as i32) as u8;
    }

    pub fn change_brightness(&mut self, delta: i32) {
        self.set_brightness(self.brightness as i32 + delta);
    }

    /// Build a display update at the current brightness
    pub fn build(&self, lines: &[String; DISPLAY_HEIGHT], cursor: Option<usize>) -> Vec<u8> {
        encode(lines, self.brightness, cursor)
    }
}

impl Default for Vfd {
    fn default() -> Self {
        Self::new(MAX_BRIGHTNESS)
    }
}
