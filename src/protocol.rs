//! Datagram formats spoken between the server and the terminals
//!
//! Every datagram carries a one-byte tag. Terminals send `d` (discovery),
//! `h` (heartbeat) and `i` (infrared report); the server answers with `D`
//! and `h` and pushes display updates as `l` (see [`crate::vfd`]).

use thiserror::Error;

/// UDP port terminals talk to
pub const DEFAULT_PORT: u16 = 3483;

/// Length of every fixed-size datagram
pub const DATAGRAM_LEN: usize = 18;

/// Rate of the terminal's hardware clock
pub const TICKS_PER_SECOND: u32 = 625_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty datagram")]
    Empty,
    #[error("'{tag}' datagram too short: {len} bytes, need {need}")]
    Short { tag: char, len: usize, need: usize },
    #[error("unknown datagram tag 0x{0:02x}")]
    UnknownTag(u8),
}

/// An infrared report: a remote button is down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrReport {
    /// Terminal clock when the code was decoded
    pub timestamp: u32,
    /// Remote model; terminals are not reliable about it
    pub remote_id: u8,
    /// Significant bits in `button_code`
    pub sig_bits: u8,
    pub button_code: u32,
}

impl IrReport {
    pub const TAG: u8 = b'i';

    /// Decode `>c B I B B I 6x`
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < DATAGRAM_LEN {
            return Err(ProtocolError::Short {
                tag: Self::TAG as char,
                len: bytes.len(),
                need: DATAGRAM_LEN,
            });
        }
        Ok(Self {
            timestamp: u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            remote_id: bytes[6],
            sig_bits: bytes[7],
            button_code: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; DATAGRAM_LEN] {
        let mut out = [0u8; DATAGRAM_LEN];
        out[0] = Self::TAG;
        out[2..6].copy_from_slice(&self.timestamp.to_be_bytes());
        out[6] = self.remote_id;
        out[7] = self.sig_bits;
        out[8..12].copy_from_slice(&self.button_code.to_be_bytes());
        out
    }

    /// Terminal clock in seconds since it last wrapped
    pub fn seconds(&self) -> f64 {
        self.timestamp as f64 / TICKS_PER_SECOND as f64
    }
}

/// A datagram received from a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Discovery,
    Heartbeat,
    Ir(IrReport),
}

impl Message {
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let tag = *bytes.first().ok_or(ProtocolError::Empty)?;
        match tag {
            b'd' => Ok(Self::Discovery),
            b'h' => Ok(Self::Heartbeat),
            IrReport::TAG => IrReport::parse(bytes).map(Self::Ir),
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}

fn reply(tag: u8) -> [u8; DATAGRAM_LEN] {
    let mut out = [0u8; DATAGRAM_LEN];
    out[0] = tag;
    out
}

/// Answer to a discovery request
pub fn discovery_reply() -> [u8; DATAGRAM_LEN] {
    reply(b'D')
}

/// Answer to a heartbeat
pub fn heartbeat_reply() -> [u8; DATAGRAM_LEN] {
    reply(b'h')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_is_answered_with_capital_d() {
        let mut request = [0u8; DATAGRAM_LEN];
        request[0] = b'd';
        assert_eq!(Message::parse(&request), Ok(Message::Discovery));

        let answer = discovery_reply();
        assert_eq!(answer[0], b'D');
        assert!(answer[1..].iter().all(|b| *b == 0));
        assert_eq!(answer.len(), 18);
    }

    #[test]
    fn heartbeat_reply_is_h_and_zeros() {
        assert_eq!(Message::parse(b"h"), Ok(Message::Heartbeat));
        let answer = heartbeat_reply();
        assert_eq!(answer[0], b'h');
        assert!(answer[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn ir_report_decodes_big_endian_fields() {
        let bytes = [
            b'i', 0, 0x00, 0x09, 0x89, 0x68, 0x00, 16, 0x00, 0x00, 0xf7, 0x32, 0, 0, 0, 0, 0, 0,
        ];
        let Message::Ir(report) = Message::parse(&bytes).unwrap() else {
            panic!("expected an IR report");
        };
        assert_eq!(report.timestamp, 625_000);
        assert_eq!(report.remote_id, 0);
        assert_eq!(report.sig_bits, 16);
        assert_eq!(report.button_code, 0xf732);
        assert!((report.seconds() - 1.0).abs() < 1e-9);
        assert_eq!(report.to_bytes(), bytes);
    }

    #[test]
    fn short_ir_report_is_rejected() {
        assert_eq!(
            Message::parse(b"i\0\0\0"),
            Err(ProtocolError::Short {
                tag: 'i',
                len: 4,
                need: DATAGRAM_LEN
            })
        );
    }

    #[test]
    fn empty_and_unknown_datagrams_are_rejected() {
        assert_eq!(Message::parse(&[]), Err(ProtocolError::Empty));
        assert_eq!(Message::parse(b"zzz"), Err(ProtocolError::UnknownTag(b'z')));
    }
}
