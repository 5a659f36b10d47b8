//! Error types for the Kerfuffle client.

use thiserror::Error;

use crate::board::DecodeError;

/// Errors that can occur when using the Kerfuffle client.
#[derive(Debug, Error)]
pub enum KerfuffleError {
    /// The transport could not reach the server (name resolution, refusal, ...).
    #[error("connection error: {0}")]
    Connect(String),

    /// Failed to send a request through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a response from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// Attempted an operation that requires an active connection, but the client is not connected.
    #[error("not connected to server")]
    NotConnected,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a protocol payload, including
    /// responses that lack a required field.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body, possibly empty.
        body: String,
    },

    /// A board cell could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl KerfuffleError {
    /// Returns `true` for failures of the connection itself.
    ///
    /// These are recovered by reconnecting rather than by picking another game.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect(_)
                | Self::TransportSend(_)
                | Self::TransportReceive(_)
                | Self::NotConnected
                | Self::Timeout
                | Self::Io(_)
        )
    }

    /// Returns `true` if recovering requires a fresh connection and a new lobby
    /// registration (transport failures, rejected credentials).
    pub fn requires_reconnect(&self) -> bool {
        self.is_transport() || matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }
}

/// A specialized [`Result`] type for Kerfuffle client operations.
pub type Result<T> = std::result::Result<T, KerfuffleError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_require_reconnect() {
        assert!(KerfuffleError::NotConnected.requires_reconnect());
        assert!(KerfuffleError::Timeout.requires_reconnect());
        assert!(KerfuffleError::Connect("refused".into()).requires_reconnect());
    }

    #[test]
    fn rejected_token_requires_reconnect() {
        let err = KerfuffleError::HttpStatus {
            status: 403,
            body: String::new(),
        };
        assert!(!err.is_transport());
        assert!(err.requires_reconnect());
    }

    #[test]
    fn protocol_errors_do_not_require_reconnect() {
        let missing = serde_json::from_str::<crate::protocol::JoinLobbyResponse>(r#"{"name":"a"}"#)
            .unwrap_err();
        assert!(!KerfuffleError::from(missing).requires_reconnect());
        let err = KerfuffleError::HttpStatus {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.requires_reconnect());
        assert_eq!(err.to_string(), "server returned HTTP 500: boom");
    }
}
