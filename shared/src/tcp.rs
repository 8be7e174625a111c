//! TCP transport built on tokio
//!
//! Socket reads and writes run in per-connection tasks; everything they see is
//! forwarded over an unbounded channel and surfaced to the single polling loop,
//! so connection buffers are only ever touched from [`Transport::poll`].

use crate::connection::{Connection, ConnectionId};
use crate::transport::{Event, Transport};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const READ_CHUNK: usize = 4096;

/// Messages from socket tasks to the polling loop
#[derive(Debug)]
enum NetEvent {
    Opened {
        id: ConnectionId,
        peer: SocketAddr,
        writer: mpsc::UnboundedSender<Vec<u8>>,
        stop: oneshot::Sender<()>,
    },
    Data {
        id: ConnectionId,
        bytes: Vec<u8>,
    },
    Closed {
        id: ConnectionId,
    },
}

struct Link {
    connection: Connection,
    writer: mpsc::UnboundedSender<Vec<u8>>,
    /// Dropping this stops the reader task
    _stop: oneshot::Sender<()>,
}

pub struct TcpTransport {
    /// Held so the channel stays open while no socket task is alive
    _events_tx: mpsc::UnboundedSender<NetEvent>,
    events_rx: mpsc::UnboundedReceiver<NetEvent>,
    links: BTreeMap<ConnectionId, Link>,
    local_addr: SocketAddr,
    acceptor: Option<JoinHandle<()>>,
}

impl TcpTransport {
    /// Binds a listener; every accepted socket becomes a connection.
    pub async fn listen<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let acceptor = tokio::spawn(accept_loop(listener, events_tx.clone()));

        Ok(Self {
            _events_tx: events_tx,
            events_rx,
            links: BTreeMap::new(),
            local_addr,
            acceptor: Some(acceptor),
        })
    }

    /// Connects to a server; the socket is reported as connection 0.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let local_addr = stream.local_addr()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        spawn_link(0, stream, &events_tx)?;

        Ok(Self {
            _events_tx: events_tx,
            events_rx,
            links: BTreeMap::new(),
            local_addr,
            acceptor: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn flush(&mut self) {
        for (id, link) in &mut self.links {
            let bytes = link.connection.take_outgoing();
            if !bytes.is_empty() && link.writer.send(bytes).is_err() {
                debug!("writer for connection {} already stopped", id);
            }
        }
    }

    fn reap(&mut self, id: ConnectionId) {
        if self
            .links
            .get(&id)
            .is_some_and(|link| !link.connection.is_open())
        {
            info!("Closing connection {}", id);
            self.links.remove(&id);
        }
    }

    fn dispatch<F>(&mut self, event: NetEvent, on_event: &mut F)
    where
        F: FnMut(&mut Connection, Event),
    {
        match event {
            NetEvent::Opened {
                id,
                peer,
                writer,
                stop,
            } => {
                info!("Connection {} opened from {}", id, peer);
                let link = self.links.entry(id).or_insert(Link {
                    connection: Connection::new(id),
                    writer,
                    _stop: stop,
                });
                on_event(&mut link.connection, Event::Opened);
                self.reap(id);
            }
            NetEvent::Data { id, bytes } => {
                if let Some(link) = self.links.get_mut(&id) {
                    link.connection.receive(&bytes);
                    on_event(&mut link.connection, Event::DataReady);
                    self.reap(id);
                }
            }
            NetEvent::Closed { id } => {
                if let Some(mut link) = self.links.remove(&id) {
                    info!("Connection {} closed by peer", id);
                    link.connection.close();
                    on_event(&mut link.connection, Event::Closed);
                }
            }
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if let Some(acceptor) = self.acceptor.take() {
            acceptor.abort();
        }
    }
}

impl Transport for TcpTransport {
    async fn poll<F>(&mut self, max_wait: Duration, mut on_event: F) -> io::Result<()>
    where
        F: FnMut(&mut Connection, Event),
    {
        self.flush();

        // An idle poll waits out `max_wait`: the channel never reports closed.
        let first = timeout(max_wait, self.events_rx.recv()).await.ok().flatten();
        if let Some(event) = first {
            self.dispatch(event, &mut on_event);
            while let Ok(event) = self.events_rx.try_recv() {
                self.dispatch(event, &mut on_event);
            }
        }

        self.flush();
        Ok(())
    }

    fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.links.get_mut(&id).map(|link| &mut link.connection)
    }

    fn connection_ids(&self) -> Vec<ConnectionId> {
        self.links.keys().copied().collect()
    }
}

async fn accept_loop(listener: TcpListener, events: mpsc::UnboundedSender<NetEvent>) {
    let mut next_id: ConnectionId = 0;
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                if let Err(e) = spawn_link(next_id, stream, &events) {
                    warn!("Failed to set up connection {}: {}", next_id, e);
                }
                next_id = next_id.wrapping_add(1);
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
        if events.is_closed() {
            break;
        }
    }
}

/// Announces a new connection, then starts its reader and writer tasks.
fn spawn_link(
    id: ConnectionId,
    stream: TcpStream,
    events: &mpsc::UnboundedSender<NetEvent>,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?;
    let (read_half, write_half) = stream.into_split();
    let (writer, outgoing) = mpsc::unbounded_channel();
    let (stop, stopped) = oneshot::channel();

    // Opened goes out before the reader exists so it always precedes Data.
    if events
        .send(NetEvent::Opened {
            id,
            peer,
            writer,
            stop,
        })
        .is_err()
    {
        return Ok(());
    }

    tokio::spawn(write_loop(id, write_half, outgoing));
    tokio::spawn(read_loop(id, read_half, events.clone(), stopped));
    Ok(())
}

async fn read_loop(
    id: ConnectionId,
    mut reader: OwnedReadHalf,
    events: mpsc::UnboundedSender<NetEvent>,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        tokio::select! {
            _ = &mut stopped => return,
            result = reader.read(&mut buffer) => match result {
                Ok(0) => break,
                Ok(len) => {
                    let bytes = buffer[..len].to_vec();
                    if events.send(NetEvent::Data { id, bytes }).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("Read error on connection {}: {}", id, e);
                    break;
                }
            },
        }
    }
    let _ = events.send(NetEvent::Closed { id });
}

async fn write_loop(
    id: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(bytes) = outgoing.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            warn!("Write error on connection {}: {}", id, e);
            return;
        }
    }
    let _ = writer.shutdown().await;
}
