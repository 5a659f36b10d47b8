//! # Kerfuffle Client
//!
//! Transport-agnostic Rust client that plays bots on a Kerfuffle game server.
//!
//! Kerfuffle is a multiplayer grid game in which bots claim territory by
//! leaving trails. This crate does the protocol plumbing: it registers with the
//! lobby, waits for a game, exchanges moves for board snapshots and keeps a
//! consistent view of the players. You only write the [`Bot`].
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] trait for any backend
//! - **HTTP built-in** — default `transport-http` feature provides `HttpTransport`
//! - **Stable player identity** — [`PlayerHandle`]s survive across turns
//! - **Self-healing** — reconnects and re-registers after transport failures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kerfuffle_client::{Bot, GameState, HttpTransport, KerfuffleClient, KerfuffleConfig, Moves};
//!
//! struct Idle;
//!
//! impl Bot for Idle {
//!     fn get_moves(&mut self, _state: &GameState) -> Moves {
//!         Moves::new()
//!     }
//! }
//!
//! let config = KerfuffleConfig::new("idler");
//! let mut client = KerfuffleClient::new(HttpTransport::new("localhost", 8080), config);
//! client.play(&mut Idle).await;
//! ```

pub mod board;
pub mod bot;
pub mod client;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod lobby;
pub mod model;
pub mod protocol;
pub mod registry;
pub mod transport;
pub mod transports;
pub mod turn;
pub mod uri;

// Re-export primary types for ergonomic imports.
pub use board::DecodeError;
pub use bot::Bot;
pub use client::{KerfuffleClient, KerfuffleConfig};
pub use connection::ConnectionManager;
pub use error::KerfuffleError;
pub use lobby::Credentials;
pub use model::{Board, Direction, GameState, Heading, Moves, PartialBoard, Position};
pub use registry::{Player, PlayerHandle, PlayerRegistry};
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
pub use turn::{GameEnd, TurnOutcome, TurnPhase, TurnProtocol};

#[cfg(feature = "transport-http")]
pub use transports::HttpTransport;
