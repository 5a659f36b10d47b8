//! Finding a game to join.

use std::time::Duration;

use tracing::{debug, info};

use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::lobby::Credentials;
use crate::protocol::{NamedEntry, GAMES_PATH};
use crate::transport::Transport;

/// Default delay between polls while no game is open.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Names of the games currently open to this bot.
///
/// # Errors
///
/// Propagates transport failures, non-success statuses (a rejected token is
/// `HttpStatus { status: 401 | 403 }`) and malformed bodies.
pub async fn list_games<T: Transport>(
    conn: &mut ConnectionManager<T>,
    credentials: &Credentials,
) -> Result<Vec<String>> {
    let entries: Vec<NamedEntry> = conn.get_json(GAMES_PATH, Some(&credentials.token)).await?;
    Ok(entries.into_iter().map(|e| e.name).collect())
}

/// Wait for a game to open and return the name of the first one listed.
///
/// Polls every `poll_interval` while the list is empty.
///
/// # Errors
///
/// Any error from [`list_games`] is returned immediately; retrying is up to the
/// caller.
pub async fn join_first_available_game<T: Transport>(
    conn: &mut ConnectionManager<T>,
    credentials: &Credentials,
    poll_interval: Duration,
) -> Result<String> {
    info!("checking for available games");
    let mut polls = 0usize;
    loop {
        let games = list_games(conn, credentials).await?;
        if let Some(first) = games.into_iter().next() {
            info!(game = %first, polls, "joining game");
            return Ok(first);
        }
        polls += 1;
        debug!(polls, "no games open yet");
        tokio::time::sleep(poll_interval).await;
    }
}
