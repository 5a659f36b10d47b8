//! Transport abstraction for the Kerfuffle HTTP protocol.
//!
//! The [`Transport`] trait is a request/response channel to one game server.
//! The client only ever has one request in flight, so implementations do not
//! need to support pipelining.
//!
//! # Connection Lifecycle
//!
//! Unlike a plain HTTP client, a transport has an explicit
//! [`connect`](Transport::connect) / [`close`](Transport::close) lifecycle so
//! the [`ConnectionManager`](crate::connection::ConnectionManager) can detect an
//! unreachable server and retry. Endpoint settings (host, port) belong to the
//! transport's constructor.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use kerfuffle_client::error::KerfuffleError;
//! use kerfuffle_client::transport::{HttpRequest, HttpResponse, Transport};
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn connect(&mut self) -> Result<(), KerfuffleError> {
//!         // Open the connection to the server
//!         todo!()
//!     }
//!
//!     async fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, KerfuffleError> {
//!         // Send the request and wait for its response
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), KerfuffleError> {
//!         // Shut down the connection
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::KerfuffleError;

/// HTTP methods used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// One request to the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute path, already percent-encoded.
    pub path: String,
    /// JSON body. Sent with `Content-Type: application/json`.
    pub body: Option<String>,
    /// Bearer token for the `Authorization` header.
    pub bearer: Option<String>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body.into()),
            bearer: None,
        }
    }

    /// Attach `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// The server's answer to an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200 OK` response with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request/response transport to the Kerfuffle game server.
///
/// # Object Safety
///
/// This trait is object-safe, so `Box<dyn Transport>` works for dynamic dispatch.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Open the connection to the server.
    ///
    /// # Errors
    ///
    /// Returns [`KerfuffleError::Connect`] (or [`KerfuffleError::Io`]) if the
    /// host cannot be resolved or refuses the connection.
    async fn connect(&mut self) -> Result<(), KerfuffleError>;

    /// Send one request and wait for its response.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`KerfuffleError::NotConnected`] before [`connect`](Transport::connect),
    /// or a transport error if the exchange fails.
    async fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, KerfuffleError>;

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`KerfuffleError::NotConnected`] if there was nothing to close,
    /// or another error if shutdown failed.
    async fn close(&mut self) -> Result<(), KerfuffleError>;
}
