//! Protocol error taxonomy
//!
//! An incomplete frame is never an error: decoders report it as `Ok(None)` or
//! [`FrameStatus::Incomplete`](crate::frame::FrameStatus::Incomplete) and the
//! caller waits for more bytes. Everything in [`ProtocolError`] is fatal for the
//! connection it was read from.

use crate::frame::MessageType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A fixed-size message declared a different payload length.
    #[error("{kind} message with size {size} != {expected}")]
    WrongSize {
        kind: MessageType,
        size: usize,
        expected: usize,
    },

    /// The structure of a message needs more bytes than its header declared.
    #[error("ran out of bytes reading {0} message")]
    RanOutOfBytes(MessageType),

    /// Bytes left over after the declared content was read.
    #[error("trailing data in {kind} message ({remaining} bytes)")]
    TrailingData { kind: MessageType, remaining: usize },

    /// The peer sent a frame with a tag this side never accepts.
    #[error("unexpected message type 0x{0:02x}")]
    UnexpectedType(u8),

    /// Fixed-width player record could not be written or read.
    #[error("player record encoding failed: {0}")]
    Record(#[from] bincode::Error),
}

impl ProtocolError {
    /// True for mismatches between declared and actual message structure.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            ProtocolError::WrongSize { .. }
                | ProtocolError::RanOutOfBytes(_)
                | ProtocolError::TrailingData { .. }
        )
    }
}
