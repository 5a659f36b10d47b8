//! HTTP transport implementation using `reqwest`.
//!
//! This module provides [`HttpTransport`], a [`Transport`] implementation that
//! talks plain `http://` to a game server at a fixed host and port. The
//! underlying client keeps at most one idle keep-alive connection, matching
//! the client's one-request-at-a-time model.
//!
//! # Feature gate
//!
//! This module is only available when the `transport-http` feature is enabled
//! (it is enabled by default).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), kerfuffle_client::KerfuffleError> {
//! use kerfuffle_client::{HttpRequest, HttpTransport, Transport};
//!
//! let mut transport = HttpTransport::new("localhost", 8080);
//! transport.connect().await?;
//! let response = transport.send(HttpRequest::get("/players")).await?;
//! println!("received: {}", response.body);
//!
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::KerfuffleError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// A [`Transport`] implementation backed by a `reqwest` client.
///
/// [`connect`](Transport::connect) resolves the host and checks that it accepts
/// TCP connections before building the client, so an unreachable server is
/// reported up front rather than on the first request.
#[derive(Debug)]
pub struct HttpTransport {
    host: String,
    port: u16,
    base_url: String,
    client: Option<reqwest::Client>,
}

impl HttpTransport {
    /// Create a transport for `http://{host}:{port}`. Does not connect.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let base_url = format!("http://{host}:{port}");
        Self {
            host,
            port,
            base_url,
            client: None,
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

fn map_send_error(e: reqwest::Error) -> KerfuffleError {
    if e.is_timeout() {
        KerfuffleError::Timeout
    } else if e.is_connect() {
        KerfuffleError::Connect(e.to_string())
    } else {
        KerfuffleError::TransportSend(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&mut self) -> Result<(), KerfuffleError> {
        tracing::debug!(host = %self.host, port = self.port, "connecting to game server");

        // Probe reachability; the pooled client opens its own connection lazily.
        tokio::net::TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| KerfuffleError::Connect(format!("{}: {e}", self.base_url)))?;

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| KerfuffleError::Connect(e.to_string()))?;
        self.client = Some(client);

        tracing::info!(url = %self.base_url, "connected to game server");
        Ok(())
    }

    async fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, KerfuffleError> {
        let client = self.client.as_ref().ok_or(KerfuffleError::NotConnected)?;

        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = client.request(method, &url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| KerfuffleError::TransportReceive(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }

    async fn close(&mut self) -> Result<(), KerfuffleError> {
        // Dropping the client closes its pooled connection.
        match self.client.take() {
            Some(_) => {
                tracing::debug!(url = %self.base_url, "closed connection to game server");
                Ok(())
            }
            None => Err(KerfuffleError::NotConnected),
        }
    }
}

#[cfg(test)]
#[cfg(feature = "transport-http")]
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

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn http_transport_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<HttpTransport>();
    }

    #[tokio::test]
    async fn connect_fails_with_unreachable_host() {
        let mut transport = HttpTransport::new("127.0.0.1", 1);
        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, KerfuffleError::Connect(_)));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn send_before_connect_is_not_connected() {
        let mut transport = HttpTransport::new("127.0.0.1", 1);
        let err = transport.send(HttpRequest::get("/players")).await.unwrap_err();
        assert!(matches!(err, KerfuffleError::NotConnected));
    }

    #[tokio::test]
    async fn close_without_connection_is_not_connected() {
        let mut transport = HttpTransport::new("127.0.0.1", 1);
        let err = transport.close().await.unwrap_err();
        assert!(matches!(err, KerfuffleError::NotConnected));
    }

    // ── Stub-server helpers ──────────────────────────────────────────────

    /// A recorded request: request line, lower-cased headers, body.
    #[derive(Debug, Clone)]
    struct Recorded {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Start a local HTTP/1.1 server that answers requests with `responses`
    /// in order and records what it received.
    async fn start_stub_server(
        responses: Vec<(u16, &'static str)>,
    ) -> (u16, Arc<StdMutex<Vec<Recorded>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let recorded = Arc::new(StdMutex::new(Vec::new()));
        let responses = Arc::new(StdMutex::new(VecDeque::from(responses)));

        let log = Arc::clone(&recorded);
        tokio::spawn(async move {
            loop {
                let Ok((tcp, _)) = listener.accept().await else {
                    return;
                };
                let log = Arc::clone(&log);
                let responses = Arc::clone(&responses);
                tokio::spawn(async move {
                    let (read, mut write) = tcp.into_split();
                    let mut reader = BufReader::new(read);
                    loop {
                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                            return;
                        }
                        let mut headers = Vec::new();
                        loop {
                            let mut line = String::new();
                            reader.read_line(&mut line).await.unwrap();
                            let line = line.trim_end();
                            if line.is_empty() {
                                break;
                            }
                            let (k, v) = line.split_once(':').unwrap();
                            headers.push((k.trim().to_ascii_lowercase(), v.trim().to_owned()));
                        }
                        let length = headers
                            .iter()
                            .find(|(k, _)| k == "content-length")
                            .map_or(0, |(_, v)| v.parse::<usize>().unwrap());
                        let mut body = vec![0u8; length];
                        reader.read_exact(&mut body).await.unwrap();

                        log.lock().unwrap().push(Recorded {
                            request_line: request_line.trim_end().to_owned(),
                            headers,
                            body: String::from_utf8(body).unwrap(),
                        });

                        let (status, reply) = responses
                            .lock()
                            .unwrap()
                            .pop_front()
                            .unwrap_or((404, "Not Found"));
                        let raw = format!(
                            "HTTP/1.1 {status} X\r\ncontent-length: {}\r\n\r\n{reply}",
                            reply.len()
                        );
                        if write.write_all(raw.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        (port, recorded)
    }

    // ── Stub-server tests ────────────────────────────────────────────────

    #[tokio::test]
    async fn get_returns_status_and_body() {
        let (port, recorded) = start_stub_server(vec![(200, r#"[{"name":"Ada"}]"#)]).await;

        let mut transport = HttpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();
        let response = transport.send(HttpRequest::get("/players")).await.unwrap();

        assert_eq!(response, HttpResponse::ok(r#"[{"name":"Ada"}]"#));
        let requests = recorded.lock().unwrap();
        assert_eq!(requests[0].request_line, "GET /players HTTP/1.1");
        assert!(requests[0].header("authorization").is_none());
    }

    #[tokio::test]
    async fn post_sends_json_body_and_bearer() {
        let (port, recorded) = start_stub_server(vec![(200, "{}")]).await;

        let mut transport = HttpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();
        let request = HttpRequest::post("/games/My%20Game", "[]").with_bearer("tok");
        transport.send(request).await.unwrap();

        let requests = recorded.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent.request_line, "POST /games/My%20Game HTTP/1.1");
        assert_eq!(sent.header("authorization"), Some("Bearer tok"));
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(sent.body, "[]");
    }

    #[tokio::test]
    async fn non_success_status_is_a_response() {
        let (port, _recorded) = start_stub_server(vec![(404, "Not Found")]).await;

        let mut transport = HttpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();
        let response = transport.send(HttpRequest::get("/games/x")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "Not Found");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn double_close_reports_not_connected() {
        let (port, _recorded) = start_stub_server(vec![]).await;

        let mut transport = HttpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();
        transport.close().await.unwrap();
        let err = transport.close().await.unwrap_err();
        assert!(matches!(err, KerfuffleError::NotConnected));

        let err = transport.send(HttpRequest::get("/players")).await.unwrap_err();
        assert!(matches!(err, KerfuffleError::NotConnected));
    }
}
