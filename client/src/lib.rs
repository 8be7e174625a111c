//! # Grid Client Library
//!
//! This library provides the client side of the networked grid game. The
//! client is deliberately thin: it never simulates anything, it only reports
//! button state and draws whatever roster the server sent last.
//!
//! ## Architecture Overview
//!
//! Every rendered frame runs the same sequence:
//! 1. Sample the keyboard and fold press edges into the controls snapshot
//! 2. Queue the snapshot for the server and clear its press counters
//! 3. Poll the transport without waiting
//! 4. Replace the local roster with the newest state snapshot, if any
//! 5. Draw the board
//!
//! Because the server sends each client its own player first, the client
//! never learns or needs a player identifier.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The mirrored roster and board occupancy.
//!
//! ### Input Module (`input`)
//! Keyboard sampling with edge detection, so a held key counts as one press.
//!
//! ### Network Module (`network`)
//! The per-frame session driver and the errors that end a session:
//! - Protocol violations from the server (malformed or unexpected frames)
//! - The server closing the connection
//! - Transport failures
//!
//! ### Rendering Module (`rendering`)
//! Board layout and macroquad drawing.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::GameState;
//! use client::network::ClientSession;
//! use shared::TcpTransport;
//!
//! # async fn frame() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = TcpTransport::connect("127.0.0.1:8080").await?;
//! let mut session = ClientSession::new();
//! let mut state = GameState::new(10, 10);
//!
//! session.controls.right.press();
//! if let Some(roster) = session.update(&mut transport).await? {
//!     state.apply_state(roster);
//! }
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
