//! The long-running play loop.
//!
//! [`KerfuffleClient`] ties the pieces together: it connects, registers with
//! the lobby, then plays one game after another with the supplied
//! [`Bot`]. Transport failures and rejected credentials restart the cycle from
//! a fresh connection; anything else only costs the current game.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = HttpTransport::new("localhost", 8080);
//! let config = KerfuffleConfig::new("circler").with_game_limit(3);
//! let mut client = KerfuffleClient::new(transport, config);
//! client.play(&mut MyBot::default()).await;
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bot::Bot;
use crate::connection::{ConnectionManager, DEFAULT_RETRY_BACKOFF};
use crate::discovery::DEFAULT_POLL_INTERVAL;
use crate::error::Result;
use crate::lobby::{join_lobby, Credentials};
use crate::model::GameState;
use crate::transport::Transport;
use crate::turn::{GameEnd, TurnPhase, TurnProtocol};

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`KerfuffleClient`].
///
/// The only required field is the bot name; all others have defaults.
///
/// # Example
///
/// ```
/// use kerfuffle_client::client::KerfuffleConfig;
/// use std::time::Duration;
///
/// let config = KerfuffleConfig::new("circler")
///     .with_persistent(false)
///     .with_retry_backoff(Duration::from_millis(250))
///     .with_game_limit(10);
/// assert_eq!(config.bot_name, "circler");
/// assert_eq!(config.game_limit, Some(10));
/// ```
#[derive(Debug, Clone)]
pub struct KerfuffleConfig {
    /// Name requested from the lobby. The lobby may hand back a different one.
    pub bot_name: String,
    /// Whether the bot stays registered between games.
    ///
    /// Defaults to **true**.
    pub persistent: bool,
    /// Delay before retrying a failed connection or a failed game, and before
    /// looking for a new game after one vanished.
    ///
    /// Defaults to **1 second**.
    pub retry_backoff: Duration,
    /// Delay between game-list polls while no game is open.
    ///
    /// Defaults to **1 second**.
    pub poll_interval: Duration,
    /// Upper bound on a single request. `None` waits as long as the transport.
    ///
    /// Defaults to **`None`**: the first move of a game blocks until the game
    /// starts, and timing it out costs the lobby registration.
    pub request_timeout: Option<Duration>,
    /// Stop after this many games. `None` plays forever.
    pub game_limit: Option<usize>,
}

impl KerfuffleConfig {
    /// Create a configuration for the given bot name with default values.
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            persistent: true,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
            game_limit: None,
        }
    }

    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Stop after `limit` games, counting finished and abandoned ones.
    #[must_use]
    pub fn with_game_limit(mut self, limit: usize) -> Self {
        self.game_limit = Some(limit);
        self
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Plays Kerfuffle games over a [`Transport`].
pub struct KerfuffleClient<T: Transport> {
    conn: ConnectionManager<T>,
    turn: TurnProtocol,
    config: KerfuffleConfig,
    credentials: Option<Credentials>,
    games_played: usize,
}

impl<T: Transport> KerfuffleClient<T> {
    pub fn new(transport: T, config: KerfuffleConfig) -> Self {
        let conn = ConnectionManager::new(transport)
            .with_retry_backoff(config.retry_backoff)
            .with_request_timeout(config.request_timeout);
        let turn = TurnProtocol::new(config.bot_name.clone())
            .with_poll_interval(config.poll_interval);
        Self {
            conn,
            turn,
            config,
            credentials: None,
            games_played: 0,
        }
    }

    pub fn config(&self) -> &KerfuffleConfig {
        &self.config
    }

    /// Credentials from the most recent lobby registration.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Games that ended so far, finished or abandoned.
    pub fn games_played(&self) -> usize {
        self.games_played
    }

    /// State of the current or last game.
    pub fn state(&self) -> &GameState {
        self.turn.state()
    }

    /// Phase of the turn protocol.
    pub fn phase(&self) -> TurnPhase {
        self.turn.phase()
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.conn
    }

    fn limit_reached(&self) -> bool {
        self.config
            .game_limit
            .is_some_and(|limit| self.games_played >= limit)
    }

    /// Connect, register with the lobby and play games until the game limit is
    /// reached.
    ///
    /// Without a game limit this only returns on error.
    ///
    /// # Errors
    ///
    /// Returns lobby registration failures, and game errors for which
    /// [`requires_reconnect`](crate::KerfuffleError::requires_reconnect) holds.
    /// Other game errors are logged and followed by the next game after
    /// `retry_backoff`.
    pub async fn run_session<B: Bot + ?Sized>(&mut self, bot: &mut B) -> Result<()> {
        if self.limit_reached() {
            return Ok(());
        }

        self.conn.connect().await;
        let credentials =
            join_lobby(&mut self.conn, &self.config.bot_name, self.config.persistent).await?;
        self.turn = TurnProtocol::new(credentials.name.clone())
            .with_poll_interval(self.config.poll_interval);
        self.credentials = Some(credentials.clone());

        while !self.limit_reached() {
            match self.turn.play_game(&mut self.conn, &credentials, bot).await {
                Ok(end) => {
                    self.games_played += 1;
                    match end {
                        GameEnd::Finished => {
                            info!(games_played = self.games_played, "game finished");
                        }
                        GameEnd::Abandoned => {
                            debug!(
                                games_played = self.games_played,
                                retry_in = ?self.config.retry_backoff,
                                "game abandoned"
                            );
                            tokio::time::sleep(self.config.retry_backoff).await;
                        }
                    }
                }
                Err(e) if e.requires_reconnect() => return Err(e),
                Err(e) => {
                    warn!(error = %e, retry_in = ?self.config.retry_backoff, "game aborted");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
            }
        }
        Ok(())
    }

    /// Play until the game limit is reached, recovering from every error.
    ///
    /// Without a game limit this never returns.
    pub async fn play<B: Bot + ?Sized>(&mut self, bot: &mut B) {
        loop {
            match self.run_session(bot).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_in = ?self.config.retry_backoff,
                        "session failed; reconnecting"
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
            }
        }

        info!(games_played = self.games_played, "game limit reached");
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "error closing connection");
        }
    }
}
