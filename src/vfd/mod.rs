//! Vacuum fluorescent display wire format
//!
//! Rendered text is translated to the display's character ROM, with a few
//! programmable slots for glyphs the ROM lacks, and packed into `l` messages.

pub mod charset;
pub mod encoder;
pub mod glyphs;

pub use encoder::{encode, Vfd, CUSTOM_SLOTS, MAX_BRIGHTNESS, MIN_BRIGHTNESS};
pub use glyphs::{Glyph, DOTTED_VERTICAL_BAR, ELLIPSIS, VOLUME_BAR_BEGIN, VOLUME_BAR_END};
