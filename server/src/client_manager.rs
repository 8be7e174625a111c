//! Client connection management for the grid server
//!
//! This module handles the server-side bookkeeping for connected clients:
//! - Connection lifecycle (open, remote close, protocol violation)
//! - Decoding every complete controls frame buffered for a client
//! - Capacity limits for new connections
//!
//! Every connection that makes it past the capacity check owns exactly one
//! player in the [`Game`]. Both are torn down together, whichever side
//! notices first.

use crate::game::Game;
use log::{debug, info, log_enabled, trace, warn, Level};
use shared::dump::hex_dump;
use shared::{Connection, ConnectionId, Event, ProtocolError};
use std::collections::HashMap;
use std::time::Instant;

/// Represents a connected client
#[derive(Debug)]
pub struct Client {
    /// Transport-assigned connection identifier
    pub id: ConnectionId,
    /// When the connection was accepted
    pub connected_at: Instant,
    /// Last time any controls frame was decoded
    pub last_seen: Instant,
    /// Controls frames decoded so far
    pub messages_received: u64,
}

impl Client {
    /// Creates a new client record stamped with the current time
    pub fn new(id: ConnectionId) -> Self {
        let now = Instant::now();
        Self {
            id,
            connected_at: now,
            last_seen: now,
            messages_received: 0,
        }
    }
}

/// Routes transport events to the game
///
/// The ClientManager owns the connection-to-client map and enforces the
/// server's capacity limit. It is the only place where a connection is
/// closed because of something the peer sent.
pub struct ClientManager {
    /// Connected clients indexed by connection id
    clients: HashMap<ConnectionId, Client>,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates a new client manager with the specified capacity limit
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Dispatches one transport event.
    ///
    /// Must be called from the transport's poll callback so that closing the
    /// connection here stops any further events for it.
    pub fn handle_event(&mut self, game: &mut Game, connection: &mut Connection, event: Event) {
        match event {
            Event::Opened => self.on_open(game, connection),
            Event::Closed => {
                info!("Client {} disconnected", connection.id());
                self.remove_client(game, connection.id());
            }
            Event::DataReady => self.on_data(game, connection),
        }
    }

    fn on_open(&mut self, game: &mut Game, connection: &mut Connection) {
        let id = connection.id();
        if self.clients.len() >= self.max_clients {
            warn!(
                "Server full ({} clients), refusing connection {}",
                self.max_clients, id
            );
            connection.close();
            return;
        }

        info!("Client {} connected", id);
        self.clients.insert(id, Client::new(id));
        game.spawn_player(id);
    }

    fn on_data(&mut self, game: &mut Game, connection: &mut Connection) {
        let id = connection.id();
        if log_enabled!(Level::Trace) {
            trace!(
                "Client {} incoming buffer:\n{}",
                id,
                hex_dump(connection.incoming())
            );
        }

        let (Some(client), Some(player)) = (self.clients.get_mut(&id), game.player_mut(id)) else {
            debug!("Ignoring data from unknown connection {}", id);
            return;
        };

        let controls = &mut player.controls;
        let result = connection.process_incoming(|buffer| controls.recv(buffer));

        match result {
            Ok(0) => {}
            Ok(frames) => {
                client.last_seen = Instant::now();
                client.messages_received += frames as u64;
            }
            Err(e) => self.disconnect(game, connection, &e),
        }
    }

    /// Closes `connection` and removes its player after a protocol violation.
    pub fn disconnect(&mut self, game: &mut Game, connection: &mut Connection, reason: &ProtocolError) {
        let id = connection.id();
        warn!("Disconnecting client {}: {}", id, reason);
        if log_enabled!(Level::Debug) {
            debug!(
                "Client {} buffer at disconnect:\n{}",
                id,
                hex_dump(connection.incoming())
            );
        }
        connection.close();
        self.remove_client(game, id);
    }

    /// Forgets the client and its player. Returns false if already gone.
    pub fn remove_client(&mut self, game: &mut Game, id: ConnectionId) -> bool {
        game.remove_player(id);
        self.clients.remove(&id).is_some()
    }

    pub fn get_client(&self, id: ConnectionId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
