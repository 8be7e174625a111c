//! Byte-stream collaborator interface
//!
//! The protocol layer never touches sockets. A transport owns the
//! [`Connection`] buffers, appends whatever bytes arrive, flushes whatever the
//! protocol queued, and reports liveness through a callback from a single
//! polling loop.

use crate::connection::{Connection, ConnectionId};
use log::debug;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// What happened to a connection during a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Opened,
    /// The peer went away. The connection is already closed when passed in.
    Closed,
    /// New bytes were appended to the incoming buffer
    DataReady,
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Flushes queued output, waits at most `max_wait` for activity, then
    /// reports every ready event to `on_event` in arrival order.
    ///
    /// A connection closed from inside `on_event` is torn down after the
    /// callback returns; no further events are reported for it, including
    /// `Closed`.
    async fn poll<F>(&mut self, max_wait: Duration, on_event: F) -> io::Result<()>
    where
        F: FnMut(&mut Connection, Event);

    fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection>;

    /// Live connections, lowest id first
    fn connection_ids(&self) -> Vec<ConnectionId>;
}

#[derive(Debug)]
enum Scripted {
    Open,
    Data(Vec<u8>),
    HangUp,
}

/// Transport driven by hand, for tests and local loopback.
///
/// Events are queued with [`open`](Self::open), [`deliver`](Self::deliver) and
/// [`hang_up`](Self::hang_up) and reported on the next poll. Flushed bytes
/// collect per connection until [`take_sent`](Self::take_sent).
#[derive(Debug, Default)]
pub struct MemoryTransport {
    connections: BTreeMap<ConnectionId, Connection>,
    pending: VecDeque<(ConnectionId, Scripted)>,
    sent: HashMap<ConnectionId, Vec<u8>>,
    next_id: ConnectionId,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a new connection and returns the id it will carry.
    pub fn open(&mut self) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push_back((id, Scripted::Open));
        id
    }

    pub fn deliver(&mut self, id: ConnectionId, bytes: &[u8]) {
        self.pending.push_back((id, Scripted::Data(bytes.to_vec())));
    }

    /// Queues a remote disconnect.
    pub fn hang_up(&mut self, id: ConnectionId) {
        self.pending.push_back((id, Scripted::HangUp));
    }

    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Everything flushed to the peer of `id` since the last call.
    pub fn take_sent(&mut self, id: ConnectionId) -> Vec<u8> {
        self.flush();
        self.sent.remove(&id).unwrap_or_default()
    }

    fn flush(&mut self) {
        for (id, connection) in &mut self.connections {
            let bytes = connection.take_outgoing();
            if !bytes.is_empty() {
                self.sent.entry(*id).or_default().extend(bytes);
            }
        }
    }

    fn reap(&mut self, id: ConnectionId) {
        if self.connections.get(&id).is_some_and(|c| !c.is_open()) {
            debug!("dropping locally closed connection {}", id);
            self.connections.remove(&id);
        }
    }
}

impl Transport for MemoryTransport {
    async fn poll<F>(&mut self, max_wait: Duration, mut on_event: F) -> io::Result<()>
    where
        F: FnMut(&mut Connection, Event),
    {
        self.flush();
        if self.pending.is_empty() {
            if !max_wait.is_zero() {
                tokio::time::sleep(max_wait).await;
            }
            return Ok(());
        }

        while let Some((id, scripted)) = self.pending.pop_front() {
            match scripted {
                Scripted::Open => {
                    let connection = self
                        .connections
                        .entry(id)
                        .or_insert_with(|| Connection::new(id));
                    on_event(connection, Event::Opened);
                }
                Scripted::Data(bytes) => {
                    if let Some(connection) = self.connections.get_mut(&id) {
                        connection.receive(&bytes);
                        on_event(connection, Event::DataReady);
                    }
                }
                Scripted::HangUp => {
                    if let Some(mut connection) = self.connections.remove(&id) {
                        connection.close();
                        on_event(&mut connection, Event::Closed);
                    }
                }
            }
            self.reap(id);
        }

        self.flush();
        Ok(())
    }

    fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }
}
