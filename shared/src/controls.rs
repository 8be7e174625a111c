//! Client input snapshot sent to the server every frame
//!
//! Each button travels as one byte: bit 7 is the held state and bits 6..0 the
//! number of presses since the previous snapshot. Decoding is additive so the
//! server can fold several snapshots into one simulation step.

use crate::connection::Connection;
use crate::error::ProtocolError;
use crate::frame::{encode_frame, try_decode, FrameStatus, MessageType};
use log::warn;

const PRESSED_BIT: u8 = 0x80;
const DOWNS_MASK: u8 = 0x7f;

/// Number of buttons, and therefore payload bytes, in a snapshot
pub const BUTTON_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button {
    /// Held down right now
    pub pressed: bool,
    /// Press transitions since the last snapshot went out
    pub downs: u8,
}

impl Button {
    /// Records a press edge.
    pub fn press(&mut self) {
        self.downs = self.downs.saturating_add(1);
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    fn to_wire(self) -> u8 {
        if self.downs & PRESSED_BIT != 0 {
            warn!(
                "button pressed {} times since last send, only 7 bits go on the wire",
                self.downs
            );
        }
        let held = if self.pressed { PRESSED_BIT } else { 0 };
        held | (self.downs & DOWNS_MASK)
    }

    fn merge_wire(&mut self, byte: u8) {
        self.pressed = byte & PRESSED_BIT != 0;
        let total = u16::from(self.downs) + u16::from(byte & DOWNS_MASK);
        if total > u16::from(u8::MAX) {
            warn!("downs counter saturated ({} presses)", total);
        }
        self.downs = total.min(u16::from(u8::MAX)) as u8;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: Button,
    pub right: Button,
    pub up: Button,
    pub down: Button,
    pub enter: Button,
}

impl Controls {
    /// Buttons in wire order
    pub fn buttons(&self) -> [&Button; BUTTON_COUNT] {
        [&self.left, &self.right, &self.up, &self.down, &self.enter]
    }

    fn buttons_mut(&mut self) -> [&mut Button; BUTTON_COUNT] {
        [
            &mut self.left,
            &mut self.right,
            &mut self.up,
            &mut self.down,
            &mut self.enter,
        ]
    }

    pub fn any_downs(&self) -> bool {
        self.buttons().iter().any(|b| b.downs > 0)
    }

    /// Clears press counts once they have been sent or applied.
    pub fn reset_downs(&mut self) {
        for button in self.buttons_mut() {
            button.downs = 0;
        }
    }

    /// Appends a controls frame to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let mut payload = [0u8; BUTTON_COUNT];
        for (byte, button) in payload.iter_mut().zip(self.buttons()) {
            *byte = button.to_wire();
        }
        encode_frame(out, MessageType::Controls, &payload);
    }

    /// Queues a controls frame on `connection`.
    pub fn send(&self, connection: &mut Connection) {
        self.write_to(connection.outgoing_mut());
    }

    /// Folds one controls frame from the front of `buffer` into `self`.
    ///
    /// Returns the bytes consumed, or `None` when the front is incomplete. A
    /// header of any other message kind, or a controls header declaring
    /// anything but five payload bytes, is an error.
    pub fn recv(&mut self, buffer: &[u8]) -> Result<Option<usize>, ProtocolError> {
        let frame = match try_decode(buffer, MessageType::Controls)? {
            FrameStatus::Complete(frame) => frame,
            FrameStatus::Incomplete => return Ok(None),
            FrameStatus::OtherType(tag) => return Err(ProtocolError::UnexpectedType(tag)),
        };

        for (button, byte) in self.buttons_mut().into_iter().zip(frame.payload) {
            button.merge_wire(*byte);
        }
        Ok(Some(frame.consumed()))
    }
}
