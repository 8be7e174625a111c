//! # Grid Server Library
//!
//! This library provides the authoritative server for the networked grid game.
//! It owns the canonical board and roster, folds client controls into it, and
//! broadcasts a full snapshot to every client once per tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Clients never move themselves. They report which buttons are held and how
//! many times each was pressed; the server applies one step per tick and sends
//! the result back.
//!
//! ### Client Management
//! Handles the lifecycle of client connections:
//! - Player creation when a connection opens
//! - Controls decoding whenever bytes arrive
//! - Teardown on remote close or on any protocol violation
//!
//! ### State Broadcasting
//! After every simulation step each client receives the whole roster with its
//! own player listed first, so no client needs to know its own identifier.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Tick Loop
//! All connection events and game updates run sequentially on one task. The
//! transport reports events through a callback from inside its poll, and the
//! loop alternates two phases:
//! - **Draining**: poll until the next deadline, handling every event
//! - **Advancing**: update the game, queue one snapshot per client
//!
//! Deadlines advance by exactly one period from the previous deadline, so the
//! tick rate does not drift under load.
//!
//! ### Stream Transport
//! Messages travel over an ordered, reliable byte stream (TCP by default).
//! Framing is handled entirely by the `shared` crate.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Maps connection events to game operations and enforces capacity.
//!
//! ### Game Module (`game`)
//! Board, players, spawn RNG and the per-tick movement rules.
//!
//! ### Network Module (`network`)
//! Server configuration, the tick schedule and the drain/advance loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//! use shared::TcpTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut transport = TcpTransport::listen("127.0.0.1:8080").await?;
//!     let mut server = Server::new(ServerConfig::default());
//!
//!     // Runs until the transport fails
//!     server.run(&mut transport).await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
