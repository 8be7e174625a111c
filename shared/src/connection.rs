//! Per-connection byte accumulation
//!
//! The transport appends received bytes with [`Connection::receive`] and
//! flushes [`Connection::take_outgoing`]; the protocol side decodes from the
//! front of the incoming buffer and appends encoded frames to the outgoing one.

use crate::error::ProtocolError;
use log::trace;

pub type ConnectionId = u32;

#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
    open: bool,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            open: true,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Marks the connection for teardown. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.open {
            trace!("connection {} closed locally", self.id);
            self.open = false;
        }
    }

    /// Bytes received but not yet decoded
    pub fn incoming(&self) -> &[u8] {
        &self.incoming
    }

    /// Bytes queued but not yet flushed
    pub fn outgoing(&self) -> &[u8] {
        &self.outgoing
    }

    pub fn receive(&mut self, bytes: &[u8]) {
        self.incoming.extend_from_slice(bytes);
    }

    pub fn send(&mut self, bytes: &[u8]) {
        if self.open {
            self.outgoing.extend_from_slice(bytes);
        }
    }

    /// Direct access for encoders that backpatch headers in place.
    ///
    /// Writes made after [`close`](Self::close) are dropped at the next flush.
    pub fn outgoing_mut(&mut self) -> &mut Vec<u8> {
        &mut self.outgoing
    }

    /// Evicts the first `count` incoming bytes.
    pub fn consume_incoming(&mut self, count: usize) {
        let count = count.min(self.incoming.len());
        self.incoming.drain(..count);
    }

    /// Hands the queued outgoing bytes to the transport.
    pub fn take_outgoing(&mut self) -> Vec<u8> {
        if !self.open {
            self.outgoing.clear();
        }
        std::mem::take(&mut self.outgoing)
    }

    /// Runs `handle` against the front of the incoming buffer until it reports
    /// that no complete message is left.
    ///
    /// `handle` returns `Some(consumed)` after handling one message and `None`
    /// when the front holds only part of one. Messages are handled in arrival
    /// order and each is evicted before the next is looked at, so a trailing
    /// partial frame survives for the next poll. The first error stops the loop
    /// and leaves the offending bytes in place.
    pub fn process_incoming<F>(&mut self, mut handle: F) -> Result<usize, ProtocolError>
    where
        F: FnMut(&[u8]) -> Result<Option<usize>, ProtocolError>,
    {
        let mut handled = 0;
        while self.open {
            match handle(&self.incoming)? {
                Some(consumed) => {
                    self.consume_incoming(consumed);
                    handled += 1;
                }
                None => break,
            }
        }
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_frame, try_decode, FrameStatus, MessageType};

    fn decode_state_frames(
        buffer: &[u8],
        seen: &mut Vec<Vec<u8>>,
    ) -> Result<Option<usize>, ProtocolError> {
        match try_decode(buffer, MessageType::State)? {
            FrameStatus::Complete(frame) => {
                seen.push(frame.payload.to_vec());
                Ok(Some(frame.consumed()))
            }
            FrameStatus::Incomplete => Ok(None),
            FrameStatus::OtherType(tag) => Err(ProtocolError::UnexpectedType(tag)),
        }
    }

    #[test]
    fn test_new_connection_is_open_and_empty() {
        let connection = Connection::new(7);
        assert_eq!(connection.id(), 7);
        assert!(connection.is_open());
        assert!(connection.incoming().is_empty());
        assert!(connection.outgoing().is_empty());
    }

    #[test]
    fn test_consume_evicts_from_front() {
        let mut connection = Connection::new(1);
        connection.receive(&[1, 2, 3, 4, 5]);
        connection.consume_incoming(2);
        assert_eq!(connection.incoming(), &[3, 4, 5]);
        connection.consume_incoming(10);
        assert!(connection.incoming().is_empty());
    }

    #[test]
    fn test_process_incoming_keeps_partial_tail() {
        let mut wire = Vec::new();
        encode_frame(&mut wire, MessageType::State, &[1]);
        encode_frame(&mut wire, MessageType::State, &[2, 2]);
        encode_frame(&mut wire, MessageType::State, &[3, 3, 3]);
        let split = wire.len() - 2;

        let mut connection = Connection::new(1);
        connection.receive(&wire[..split]);

        let mut seen = Vec::new();
        let handled = connection
            .process_incoming(|buffer| decode_state_frames(buffer, &mut seen))
            .unwrap();
        assert_eq!(handled, 2);
        assert_eq!(seen, vec![vec![1], vec![2, 2]]);
        assert_eq!(connection.incoming().len(), 5);

        connection.receive(&wire[split..]);
        let handled = connection
            .process_incoming(|buffer| decode_state_frames(buffer, &mut seen))
            .unwrap();
        assert_eq!(handled, 1);
        assert_eq!(seen[2], vec![3, 3, 3]);
        assert!(connection.incoming().is_empty());
    }

    #[test]
    fn test_process_incoming_stops_on_error() {
        let mut connection = Connection::new(1);
        let mut wire = Vec::new();
        encode_frame(&mut wire, MessageType::State, &[1]);
        encode_frame(&mut wire, MessageType::Controls, &[0; 5]);
        connection.receive(&wire);

        let mut seen = Vec::new();
        let result = connection.process_incoming(|buffer| decode_state_frames(buffer, &mut seen));
        assert!(matches!(result, Err(ProtocolError::UnexpectedType(0x01))));
        assert_eq!(seen.len(), 1);
        assert_eq!(connection.incoming().len(), 9);
    }

    #[test]
    fn test_closed_connection_drops_outgoing() {
        let mut connection = Connection::new(3);
        connection.send(&[1, 2]);
        connection.close();
        connection.close();
        connection.send(&[3]);
        connection.outgoing_mut().push(4);

        assert!(!connection.is_open());
        assert!(connection.take_outgoing().is_empty());
    }

    #[test]
    fn test_take_outgoing_drains_queue() {
        let mut connection = Connection::new(3);
        connection.send(&[1, 2]);
        connection.send(&[3]);
        assert_eq!(connection.take_outgoing(), vec![1, 2, 3]);
        assert!(connection.outgoing().is_empty());
    }
}
