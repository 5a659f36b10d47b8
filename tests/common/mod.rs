#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Kerfuffle client integration tests.
//!
//! Provides a scripted [`MockTransport`] and helper functions for constructing
//! common server response bodies.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use kerfuffle_client::{HttpRequest, HttpResponse, KerfuffleError, Transport};
use serde_json::{json, Value};

// ── MockTransport ───────────────────────────────────────────────────

/// Shared handles for inspecting what the client did with a [`MockTransport`].
#[derive(Clone, Default)]
pub struct MockHandles {
    /// Every request the client sent, in order.
    pub sent: Arc<StdMutex<Vec<HttpRequest>>>,
    /// Number of `connect()` calls, failed ones included.
    pub connects: Arc<AtomicUsize>,
    /// Number of `close()` calls on an open connection.
    pub closes: Arc<AtomicUsize>,
}

impl MockHandles {
    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// A scripted mock transport for integration testing.
///
/// Scripted responses are consumed in order by `send()`. Running out of script
/// panics so a runaway loop fails the test instead of hanging it.
pub struct MockTransport {
    responses: VecDeque<Result<HttpResponse, KerfuffleError>>,
    failing_connects: usize,
    delays: HashMap<usize, Duration>,
    connected: bool,
    handles: MockHandles,
}

impl MockTransport {
    /// Create a mock transport with the given scripted responses.
    pub fn new(responses: Vec<Result<HttpResponse, KerfuffleError>>) -> (Self, MockHandles) {
        let handles = MockHandles::default();
        let transport = Self {
            responses: VecDeque::from(responses),
            failing_connects: 0,
            delays: HashMap::new(),
            connected: false,
            handles: handles.clone(),
        };
        (transport, handles)
    }

    /// Make the first `count` connection attempts fail.
    #[must_use]
    pub fn with_failing_connects(mut self, count: usize) -> Self {
        self.failing_connects = count;
        self
    }

    /// Hold the response to the `index`-th request (0-based) for `delay`, the
    /// way the server holds the first move until a game starts.
    #[must_use]
    pub fn with_delay_on(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), KerfuffleError> {
        self.handles.connects.fetch_add(1, Ordering::SeqCst);
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(KerfuffleError::Connect("connection refused".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, KerfuffleError> {
        if !self.connected {
            return Err(KerfuffleError::NotConnected);
        }
        let label = format!("{} {}", request.method.as_str(), request.path);
        let index = {
            let mut sent = self.handles.sent.lock().unwrap();
            sent.push(request);
            sent.len() - 1
        };
        if let Some(delay) = self.delays.get(&index).copied() {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for {label}"))
    }

    async fn close(&mut self) -> Result<(), KerfuffleError> {
        if !self.connected {
            return Err(KerfuffleError::NotConnected);
        }
        self.connected = false;
        self.handles.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Response helpers ────────────────────────────────────────────────

/// `200 OK` with the given body.
pub fn ok(body: impl Into<String>) -> Result<HttpResponse, KerfuffleError> {
    Ok(HttpResponse::ok(body))
}

/// The server's answer to a premature turn: `404 Not Found` with a plain body.
pub fn not_found() -> Result<HttpResponse, KerfuffleError> {
    Ok(HttpResponse::new(404, "Not Found"))
}

/// Lobby registration response.
pub fn lobby_json(name: &str, token: &str) -> String {
    json!({ "name": name, "token": token }).to_string()
}

/// `[{name}, ...]` list body for `/games` and `/players`.
pub fn names_json(names: &[&str]) -> String {
    Value::Array(names.iter().map(|n| json!({ "name": n })).collect()).to_string()
}

/// A visible player entry for a turn response.
pub fn player(name: &str, id: i32, score: i32, pos: (i32, i32)) -> Value {
    json!({
        "name": name,
        "id": id,
        "score": score,
        "pos": { "x": pos.0, "y": pos.1 },
        "dir": { "x": 1, "y": 0 },
    })
}

/// A running-game turn response on a 10x10 board with a 2x2 view at the origin.
pub fn turn_json(players: Vec<Value>) -> String {
    json!({
        "over": false,
        "boardWidth": 10,
        "boardHeight": 10,
        "viewOrigin": { "x": 0, "y": 0 },
        "players": players,
        "board": [["0,", ","], [",0", "1,1"]],
    })
    .to_string()
}

/// A finished-game turn response.
pub fn over_json() -> String {
    json!({ "over": true, "boardWidth": 10, "boardHeight": 10 }).to_string()
}

/// Parse a recorded request body as JSON.
pub fn body_json(request: &HttpRequest) -> Value {
    serde_json::from_str(request.body.as_deref().expect("request has a body"))
        .expect("request body is JSON")
}
