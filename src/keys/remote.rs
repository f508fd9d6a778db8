//! Remote control models and their button code tables

use super::KeyId;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Remote id reported by terminals that ship with the JVC DVD remote
pub const JVC_REMOTE_ID: u8 = 0;

/// A remote control model and its button codes
#[derive(Debug)]
pub struct RemoteModel {
    /// Id carried in the IR report
    pub id: u8,
    /// Display name for the model
    pub name: &'static str,
    mapping: HashMap<u32, KeyId>,
}

impl RemoteModel {
    fn new(id: u8, name: &'static str, codes: &[(u32, KeyId)]) -> Self {
        Self {
            id,
            name,
            mapping: codes.iter().copied().collect(),
        }
    }

    /// Translate a button code of this model
    pub fn lookup(&self, code: u32) -> Option<KeyId> {
        self.mapping.get(&code).copied()
    }

    /// Number of known button codes
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Button codes of the JVC DVD remote
const JVC_CODES: &[(u32, KeyId)] = &[
    (0x0000_f776, KeyId::Digit0),
    (0x0000_f786, KeyId::Digit1),
    (0x0000_f746, KeyId::Digit2),
    (0x0000_f7c6, KeyId::Digit3),
    (0x0000_f726, KeyId::Digit4),
    (0x0000_f7a6, KeyId::Digit5),
    (0x0000_f766, KeyId::Digit6),
    (0x0000_f7e6, KeyId::Digit7),
    (0x0000_f716, KeyId::Digit8),
    (0x0000_f796, KeyId::Digit9),
    (0x0000_f78b, KeyId::ArrowDown),
    (0x0000_f74b, KeyId::ArrowLeft),
    (0x0000_f7cb, KeyId::ArrowRight),
    (0x0000_f70b, KeyId::ArrowUp),
    (0x0000_f70e, KeyId::Rewind),
    (0x0000_f76e, KeyId::FastForward),
    (0x0000_f78d, KeyId::ChannelDown), // CH-
    (0x0000_f70d, KeyId::ChannelUp),   // CH+
    (0x0000_f703, KeyId::Display),     // DISP
    (0x0000_f7b6, KeyId::Guide),
    (0x0000_f783, KeyId::MenuHome),
    (0x0000_c038, KeyId::Mute),
    (0x0000_c538, KeyId::Mute),
    (0x0000_f72b, KeyId::Shuffle),
    (0x0000_f7b2, KeyId::Pause),
    (0x0000_f7f6, KeyId::Pip),
    (0x0000_f732, KeyId::Play),
    (0x0000_f7d6, KeyId::Play),
    (0x0000_f702, KeyId::Power),
    (0x0000_f743, KeyId::Record), // REC
    (0x0000_f7ab, KeyId::Repeat), // RECALL
    (0x0000_f7b3, KeyId::Sleep),
    (0x0000_f7c2, KeyId::Stop),
    (0x0000_c0f8, KeyId::VolumeDown),
    (0x0000_c5f8, KeyId::VolumeDown),
    (0x0000_f7f8, KeyId::VolumeDown),
    (0x0000_c078, KeyId::VolumeUp),
    (0x0000_c578, KeyId::VolumeUp),
    (0x0000_f778, KeyId::VolumeUp),
];

/// All supported remote models
pub static REMOTES: LazyLock<Vec<RemoteModel>> =
    LazyLock::new(|| vec![RemoteModel::new(JVC_REMOTE_ID, "JVC DVD", JVC_CODES)]);

/// Translate a button code reported by a terminal.
///
/// Terminals do not report the remote id reliably, so an unknown id falls
/// back to the JVC table. Unknown codes yield `None`.
pub fn lookup(remote_id: u8, code: u32) -> Option<KeyId> {
    let model = REMOTES
        .iter()
        .find(|m| m.id == remote_id)
        .or_else(|| REMOTES.iter().find(|m| m.id == JVC_REMOTE_ID))?;
    model.lookup(code)
}
