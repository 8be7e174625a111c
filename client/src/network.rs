//! Client session: sends the controls snapshot every frame and picks up the
//! newest state snapshot from the server

use log::{debug, info, log_enabled, warn, Level};
use shared::dump::hex_dump;
use shared::{
    read_state_message, Connection, ConnectionId, Controls, Event, Player, ProtocolError,
    Transport,
};
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("connection to server lost")]
    ConnectionLost,
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

pub struct ClientSession {
    /// Buttons accumulated since the last send
    pub controls: Controls,
    server: Option<ConnectionId>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            controls: Controls::default(),
            server: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.server.is_some()
    }

    /// One client frame.
    ///
    /// Queues the controls snapshot and clears its press counters, then polls
    /// without waiting. Returns the newest roster received during the poll;
    /// older snapshots that arrived in the same batch are dropped.
    pub async fn update<T: Transport>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<Vec<Player>>, ClientError> {
        if let Some(connection) = self.server.and_then(|id| transport.connection_mut(id)) {
            self.controls.send(connection);
            self.controls.reset_downs();
        }

        let mut latest = None;
        let mut failure = None;
        let server = &mut self.server;
        transport
            .poll(Duration::ZERO, |connection, event| match event {
                Event::Opened => {
                    info!("Connected to server (connection {})", connection.id());
                    *server = Some(connection.id());
                }
                Event::Closed => {
                    warn!("Server closed the connection");
                    failure = Some(ClientError::ConnectionLost);
                }
                Event::DataReady => {
                    if let Err(e) = read_states(connection, &mut latest) {
                        if log_enabled!(Level::Debug) {
                            debug!("Buffer at failure:\n{}", hex_dump(connection.incoming()));
                        }
                        connection.close();
                        failure = Some(e.into());
                    }
                }
            })
            .await?;

        if let Some(e) = failure {
            self.server = None;
            return Err(e);
        }
        Ok(latest)
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes every complete state frame, keeping only the last roster.
fn read_states(
    connection: &mut Connection,
    latest: &mut Option<Vec<Player>>,
) -> Result<(), ProtocolError> {
    connection.process_incoming(|buffer| {
        Ok(read_state_message(buffer)?.map(|(roster, consumed)| {
            *latest = Some(roster);
            consumed
        }))
    })?;
    Ok(())
}
