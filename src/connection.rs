//! Connection ownership and the reconnect policy.
//!
//! [`ConnectionManager`] wraps a [`Transport`] and is the only place that opens
//! or closes it. [`connect`](ConnectionManager::connect) never gives up: it
//! retries with a fixed backoff until the server answers. Every request goes
//! through [`request`](ConnectionManager::request), which applies the request
//! timeout and drops the connection on transport failures so the outer loop
//! knows to reconnect.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{KerfuffleError, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Default delay between connection attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Owns a [`Transport`] and its retry/reconnect policy.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    connected: bool,
    retry_backoff: Duration,
    request_timeout: Option<Duration>,
}

impl<T: Transport> ConnectionManager<T> {
    /// Wrap `transport` with the default backoff and no request timeout. Does
    /// not connect.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            connected: false,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            request_timeout: None,
        }
    }

    /// Set the delay between connection attempts.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the per-request timeout. `None` (the default) waits as long as the
    /// transport does.
    ///
    /// The server holds the first move of a game open until the game starts,
    /// so a limit shorter than the lobby wait forfeits the seat.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Connect to the server, retrying until it succeeds.
    ///
    /// Any existing connection is closed first.
    pub async fn connect(&mut self) {
        loop {
            if let Err(e) = self.close().await {
                warn!(error = %e, "failed to close stale connection");
            }

            match self.transport.connect().await {
                Ok(()) => {
                    self.connected = true;
                    debug!("connection established");
                    return;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_in = ?self.retry_backoff,
                        "error connecting to game server; the server might not be running"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
            }
        }
    }

    /// Close the connection. A no-op when not connected.
    ///
    /// # Errors
    ///
    /// Surfaces shutdown errors from the transport, except
    /// [`KerfuffleError::NotConnected`], which is expected when the peer
    /// already dropped the connection.
    pub async fn close(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;

        match self.transport.close().await {
            Ok(()) => Ok(()),
            Err(KerfuffleError::NotConnected) => {
                debug!("connection was already closed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Send one request and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`KerfuffleError::NotConnected`] if not connected,
    /// [`KerfuffleError::Timeout`] if the request timeout elapses, or the
    /// transport's error. Transport-level failures close the connection.
    pub async fn request(&mut self, request: HttpRequest) -> Result<HttpResponse> {
        if !self.connected {
            return Err(KerfuffleError::NotConnected);
        }

        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        let result = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .unwrap_or(Err(KerfuffleError::Timeout)),
            None => self.transport.send(request).await,
        };

        if let Err(e) = &result {
            if e.is_transport() {
                warn!(error = %e, "transport failure; dropping connection");
                if let Err(close_err) = self.close().await {
                    debug!(error = %close_err, "error while dropping failed connection");
                }
            }
        }
        result
    }

    /// `GET path` and decode a JSON response.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), plus [`KerfuffleError::HttpStatus`] for a
    /// non-success status and [`KerfuffleError::Serialization`] for a body of
    /// the wrong shape.
    pub async fn get_json<R: DeserializeOwned>(
        &mut self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<R> {
        let mut request = HttpRequest::get(path);
        if let Some(token) = bearer {
            request = request.with_bearer(token);
        }
        let response = self.request(request).await?;
        decode_success(response)
    }

    /// `POST path` with a JSON body and decode a JSON response.
    ///
    /// # Errors
    ///
    /// As [`get_json`](Self::get_json).
    pub async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &mut self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<R> {
        let response = self.post_raw(path, body, bearer).await?;
        decode_success(response)
    }

    /// `POST path` with a JSON body and return the response undecoded.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), plus serialization failures of `body`.
    pub async fn post_raw<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::post(path, serde_json::to_string(body)?);
        if let Some(token) = bearer {
            request = request.with_bearer(token);
        }
        self.request(request).await
    }
}

fn decode_success<R: DeserializeOwned>(response: HttpResponse) -> Result<R> {
    if !response.is_success() {
        return Err(KerfuffleError::HttpStatus {
            status: response.status,
            body: response.body,
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

impl<T: Transport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connected", &self.connected)
            .field("retry_backoff", &self.retry_backoff)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// A transport whose connect and close results are scripted.
    #[derive(Default)]
    struct ScriptedTransport {
        connect_results: VecDeque<Result<()>>,
        close_results: VecDeque<Result<()>>,
        responses: VecDeque<Result<HttpResponse>>,
        connect_calls: usize,
        close_calls: usize,
        sent: Vec<HttpRequest>,
        hang: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn connect(&mut self) -> Result<()> {
            self.connect_calls += 1;
            self.connect_results.pop_front().unwrap_or(Ok(()))
        }

        async fn send(&mut self, request: HttpRequest) -> Result<HttpResponse> {
            self.sent.push(request);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::ok("null")))
        }

        async fn close(&mut self) -> Result<()> {
            self.close_calls += 1;
            self.close_results.pop_front().unwrap_or(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connect_retries_until_success() {
        let transport = ScriptedTransport {
            connect_results: VecDeque::from(vec![
                Err(KerfuffleError::Connect("refused".into())),
                Err(KerfuffleError::Connect("no such host".into())),
            ]),
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport);

        let started = tokio::time::Instant::now();
        conn.connect().await;

        assert!(conn.is_connected());
        assert_eq!(conn.transport().connect_calls, 3);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn connect_closes_stale_connection_first() {
        let mut conn = ConnectionManager::new(ScriptedTransport::default());
        conn.connect().await;
        assert_eq!(conn.transport().close_calls, 0);

        conn.connect().await;
        assert_eq!(conn.transport().close_calls, 1);
        assert!(conn.is_connected());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut conn = ConnectionManager::new(ScriptedTransport::default());
        conn.close().await.unwrap();
        assert_eq!(conn.transport().close_calls, 0);

        conn.connect().await;
        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert_eq!(conn.transport().close_calls, 1);
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn close_swallows_not_connected_only() {
        let transport = ScriptedTransport {
            close_results: VecDeque::from(vec![
                Err(KerfuffleError::NotConnected),
                Err(KerfuffleError::TransportSend("reset".into())),
            ]),
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport);

        conn.connect().await;
        conn.close().await.unwrap();

        conn.connect().await;
        let err = conn.close().await.unwrap_err();
        assert!(matches!(err, KerfuffleError::TransportSend(_)));
    }

    #[tokio::test]
    async fn request_requires_connection() {
        let mut conn = ConnectionManager::new(ScriptedTransport::default());
        let err = conn.request(HttpRequest::get("/players")).await.unwrap_err();
        assert!(matches!(err, KerfuffleError::NotConnected));
        assert!(conn.transport().sent.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_is_awaited_without_a_timeout() {
        let transport = ScriptedTransport {
            responses: VecDeque::from(vec![Ok(HttpResponse::ok("{}"))]),
            delay: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport);
        assert_eq!(conn.request_timeout, None);
        conn.connect().await;

        let started = tokio::time::Instant::now();
        let response = conn.request(HttpRequest::get("/games/g")).await.unwrap();

        assert_eq!(response.body, "{}");
        assert!(started.elapsed() >= Duration::from_secs(120));
        assert!(conn.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn request_times_out_and_marks_connection_stale() {
        let transport = ScriptedTransport {
            hang: true,
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport)
            .with_request_timeout(Some(Duration::from_secs(5)));
        conn.connect().await;

        let err = conn.request(HttpRequest::get("/games")).await.unwrap_err();
        assert!(matches!(err, KerfuffleError::Timeout));
        assert!(!conn.is_connected());
        assert_eq!(conn.transport().close_calls, 1);
    }

    #[tokio::test]
    async fn get_json_attaches_bearer_and_decodes() {
        let transport = ScriptedTransport {
            responses: VecDeque::from(vec![Ok(HttpResponse::ok("[1,2]"))]),
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport);
        conn.connect().await;

        let values: Vec<i32> = conn.get_json("/games", Some("tok")).await.unwrap();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(conn.transport().sent[0].bearer.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let transport = ScriptedTransport {
            responses: VecDeque::from(vec![Ok(HttpResponse::new(403, "Forbidden"))]),
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport);
        conn.connect().await;

        let err = conn
            .get_json::<Vec<i32>>("/games", Some("stale"))
            .await
            .unwrap_err();
        assert!(matches!(err, KerfuffleError::HttpStatus { status: 403, .. }));
        assert!(err.requires_reconnect());
        assert!(conn.is_connected());
    }

    #[tokio::test]
    async fn transport_error_marks_connection_stale() {
        let transport = ScriptedTransport {
            responses: VecDeque::from(vec![Err(KerfuffleError::TransportReceive(
                "eof".into(),
            ))]),
            ..Default::default()
        };
        let mut conn = ConnectionManager::new(transport);
        conn.connect().await;

        assert!(conn.request(HttpRequest::get("/games")).await.is_err());
        assert!(!conn.is_connected());
        assert_eq!(conn.transport().close_calls, 1);
    }
}
