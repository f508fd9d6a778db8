//! Display content model and animation

pub mod animator;
pub mod content;
pub mod screensaver;

pub use animator::{Animator, AnimatorSettings, ScrollStrategy};
pub use content::{
    center_align, progress_indicator, right_align, Content, DISPLAY_HEIGHT, DISPLAY_WIDTH,
};
pub use screensaver::{ScreenSaver, ScreenSaverKind};
