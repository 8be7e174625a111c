//! Length-prefixed message framing shared by every message kind
//!
//! Wire layout of a frame:
//!
//! ```text
//! [type:1][length_lo:1][length_mid:1][length_hi:1][payload:length]
//! ```
//!
//! The length is a 24-bit little-endian count of payload bytes. A frame is
//! complete only once all `HEADER_LEN + length` bytes are buffered.

use crate::error::ProtocolError;
use std::fmt;

/// Size of the type tag plus the 24-bit length
pub const HEADER_LEN: usize = 4;

/// Largest payload the 24-bit length field can describe
pub const MAX_PAYLOAD_LEN: usize = (1 << 24) - 1;

/// Message kinds and their one-byte wire tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client to server button snapshot
    Controls,
    /// Server to client roster snapshot
    State,
}

impl MessageType {
    pub const fn tag(self) -> u8 {
        match self {
            MessageType::Controls => 0x01,
            MessageType::State => b's',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(MessageType::Controls),
            b's' => Some(MessageType::State),
            _ => None,
        }
    }

    /// Payload length hard-wired into the protocol, if any
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            MessageType::Controls => Some(5),
            MessageType::State => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Controls => write!(f, "C2S_Controls"),
            MessageType::State => write!(f, "S2C_State"),
        }
    }
}

/// A complete frame borrowed from the front of a receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub kind: MessageType,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// Bytes to evict from the buffer once this frame is handled
    pub fn consumed(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }
}

/// Non-fatal outcomes of looking at the front of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus<'a> {
    /// Not enough bytes yet; wait for the next poll
    Incomplete,
    /// The leading tag belongs to some other message kind
    OtherType(u8),
    Complete(Frame<'a>),
}

/// Position of a placeholder header written by [`begin_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMark {
    payload_start: usize,
}

fn write_header(out: &mut Vec<u8>, kind: MessageType, len: usize) {
    debug_assert!(len <= MAX_PAYLOAD_LEN, "payload of {} bytes", len);
    out.push(kind.tag());
    out.push(len as u8);
    out.push((len >> 8) as u8);
    out.push((len >> 16) as u8);
}

/// Appends a complete frame around `payload`.
pub fn encode_frame(out: &mut Vec<u8>, kind: MessageType, payload: &[u8]) {
    out.reserve(HEADER_LEN + payload.len());
    write_header(out, kind, payload.len());
    out.extend_from_slice(payload);
}

/// Writes a header with a zero length; the payload is appended directly to
/// `out` afterwards and [`finish_frame`] patches the real length in.
pub fn begin_frame(out: &mut Vec<u8>, kind: MessageType) -> FrameMark {
    write_header(out, kind, 0);
    FrameMark {
        payload_start: out.len(),
    }
}

/// Backpatches the length of a frame opened with [`begin_frame`].
pub fn finish_frame(out: &mut [u8], mark: FrameMark) {
    let len = out.len() - mark.payload_start;
    debug_assert!(len <= MAX_PAYLOAD_LEN, "payload of {} bytes", len);
    let start = mark.payload_start;
    out[start - 3] = len as u8;
    out[start - 2] = (len >> 8) as u8;
    out[start - 1] = (len >> 16) as u8;
}

/// Reads the declared payload length from a buffered header.
pub fn declared_len(header: &[u8]) -> Option<usize> {
    if header.len() < HEADER_LEN {
        return None;
    }
    Some(usize::from(header[1]) | usize::from(header[2]) << 8 | usize::from(header[3]) << 16)
}

/// Inspects the front of `buffer` for a frame of kind `expected`.
///
/// A fixed-size kind with the wrong declared length is rejected as soon as the
/// header is visible, without waiting for the payload: the stream cannot be
/// trusted past that point.
pub fn try_decode(buffer: &[u8], expected: MessageType) -> Result<FrameStatus<'_>, ProtocolError> {
    let Some(size) = declared_len(buffer) else {
        return Ok(FrameStatus::Incomplete);
    };
    if buffer[0] != expected.tag() {
        return Ok(FrameStatus::OtherType(buffer[0]));
    }
    if let Some(fixed) = expected.fixed_len() {
        if size != fixed {
            return Err(ProtocolError::WrongSize {
                kind: expected,
                size,
                expected: fixed,
            });
        }
    }
    if buffer.len() < HEADER_LEN + size {
        return Ok(FrameStatus::Incomplete);
    }

    Ok(FrameStatus::Complete(Frame {
        kind: expected,
        payload: &buffer[HEADER_LEN..HEADER_LEN + size],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_little_endian() {
        let payload = vec![0xaa; 0x010203];
        let mut out = Vec::new();
        encode_frame(&mut out, MessageType::State, &payload);

        assert_eq!(&out[..4], &[b's', 0x03, 0x02, 0x01]);
        assert_eq!(out.len(), 4 + 0x010203);
    }

    #[test]
    fn test_tags_round_trip() {
        for kind in [MessageType::Controls, MessageType::State] {
            assert_eq!(MessageType::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MessageType::from_tag(0x00), None);
    }

    #[test]
    fn test_short_buffer_is_incomplete() {
        assert_eq!(
            try_decode(&[], MessageType::State).unwrap(),
            FrameStatus::Incomplete
        );
        assert_eq!(
            try_decode(&[b's', 2, 0], MessageType::State).unwrap(),
            FrameStatus::Incomplete
        );
    }

    #[test]
    fn test_missing_payload_is_incomplete() {
        let buffer = [b's', 3, 0, 0, 1, 2];
        assert_eq!(
            try_decode(&buffer, MessageType::State).unwrap(),
            FrameStatus::Incomplete
        );
    }

    #[test]
    fn test_other_type_is_reported() {
        let buffer = [0x01, 5, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            try_decode(&buffer, MessageType::State).unwrap(),
            FrameStatus::OtherType(0x01)
        );
    }

    #[test]
    fn test_fixed_size_mismatch_is_fatal_before_payload_arrives() {
        let result = try_decode(&[0x01, 4, 0, 0], MessageType::Controls);
        assert!(matches!(
            result,
            Err(ProtocolError::WrongSize {
                size: 4,
                expected: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_complete_frame_reports_consumed_bytes() {
        let mut buffer = Vec::new();
        encode_frame(&mut buffer, MessageType::State, &[9, 8, 7]);
        buffer.extend_from_slice(&[b's', 0]);

        match try_decode(&buffer, MessageType::State).unwrap() {
            FrameStatus::Complete(frame) => {
                assert_eq!(frame.kind, MessageType::State);
                assert_eq!(frame.payload, &[9, 8, 7]);
                assert_eq!(frame.consumed(), 7);
            }
            other => panic!("expected a complete frame, got {:?}", other),
        }
    }

    #[test]
    fn test_backpatched_frame_matches_direct_encoding() {
        let mut patched = vec![0xee];
        let mark = begin_frame(&mut patched, MessageType::State);
        patched.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        finish_frame(&mut patched, mark);

        let mut direct = vec![0xee];
        encode_frame(&mut direct, MessageType::State, &[1, 2, 3, 4, 5, 6]);

        assert_eq!(patched, direct);
    }

    #[test]
    fn test_byte_by_byte_feed_matches_whole_buffer() {
        let mut wire = Vec::new();
        encode_frame(&mut wire, MessageType::State, b"grid");

        let whole = match try_decode(&wire, MessageType::State).unwrap() {
            FrameStatus::Complete(frame) => frame,
            other => panic!("unexpected {:?}", other),
        };

        let mut fed = Vec::new();
        for (i, byte) in wire.iter().enumerate() {
            fed.push(*byte);
            let status = try_decode(&fed, MessageType::State).unwrap();
            if i + 1 < wire.len() {
                assert_eq!(status, FrameStatus::Incomplete, "after {} bytes", i + 1);
            } else {
                assert_eq!(status, FrameStatus::Complete(whole));
            }
        }
    }
}
