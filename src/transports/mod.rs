//! Transport implementations for the Kerfuffle protocol.
//!
//! This module provides concrete [`Transport`](crate::Transport) implementations
//! behind feature gates. Enable the corresponding Cargo feature to pull in
//! a transport:
//!
//! | Feature          | Transport         |
//! |------------------|-------------------|
//! | `transport-http` | [`HttpTransport`] |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), kerfuffle_client::KerfuffleError> {
//! use kerfuffle_client::{HttpRequest, HttpTransport, Transport};
//!
//! let mut http = HttpTransport::new("localhost", 8080);
//! http.connect().await?;
//! let players = http.send(HttpRequest::get("/players")).await?;
//! println!("server said: {}", players.body);
//!
//! http.close().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "transport-http")]
pub mod http;

#[cfg(feature = "transport-http")]
pub use http::HttpTransport;
