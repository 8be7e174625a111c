//! Wire protocol and connection plumbing shared by the grid server and client
//!
//! Two message kinds travel over an ordered byte stream, each wrapped in the
//! same four-byte frame header:
//!
//! - `C2S_Controls`: a client's five-button snapshot, sent every frame
//! - `S2C_State`: the full player roster, broadcast by the server every tick
//!
//! Decoders never block and never guess: a short buffer is reported as
//! incomplete and retried on the next poll, while a structural mismatch is a
//! [`ProtocolError`] that ends the connection it came from.

pub mod board;
pub mod connection;
pub mod controls;
pub mod dump;
pub mod error;
pub mod frame;
pub mod state;
pub mod tcp;
pub mod transport;

pub use board::{Board, Tile, MAX_DIMENSION};
pub use connection::{Connection, ConnectionId};
pub use controls::{Button, Controls};
pub use error::ProtocolError;
pub use frame::{FrameStatus, MessageType};
pub use state::{read_state_message, write_state_message, Color, Player, Position};
pub use tcp::TcpTransport;
pub use transport::{Event, MemoryTransport, Transport};

pub const BOARD_WIDTH: i32 = 10;
pub const BOARD_HEIGHT: i32 = 10;

/// Server simulation steps per second
pub const DEFAULT_TICK_RATE: u32 = 30;
