//! Lobby registration.

use tracing::{debug, info};

use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::protocol::{JoinLobbyRequest, JoinLobbyResponse, NamedEntry, PLAYERS_PATH};
use crate::transport::Transport;

/// What the lobby hands back on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Canonical bot name. May differ from the requested one after a name
    /// conflict; every identity lookup must use this one.
    pub name: String,
    /// Bearer token for authenticated calls.
    pub token: String,
}

impl From<JoinLobbyResponse> for Credentials {
    fn from(response: JoinLobbyResponse) -> Self {
        Self {
            name: response.name,
            token: response.token,
        }
    }
}

/// Register the bot with the lobby.
///
/// # Errors
///
/// Propagates transport failures, non-success statuses and responses that lack
/// `name` or `token`.
pub async fn join_lobby<T: Transport>(
    conn: &mut ConnectionManager<T>,
    requested_name: &str,
    persistent: bool,
) -> Result<Credentials> {
    let request = JoinLobbyRequest {
        name: requested_name.to_owned(),
        persistent,
    };
    let response: JoinLobbyResponse = conn.post_json(PLAYERS_PATH, &request, None).await?;

    if response.name != requested_name {
        info!(requested = %requested_name, assigned = %response.name, "lobby renamed bot");
    } else {
        info!(name = %response.name, "joined lobby");
    }
    Ok(response.into())
}

/// Names of the players registered in the lobby.
///
/// # Errors
///
/// Propagates transport failures, non-success statuses and malformed bodies.
pub async fn list_players<T: Transport>(conn: &mut ConnectionManager<T>) -> Result<Vec<String>> {
    let entries: Vec<NamedEntry> = conn.get_json(PLAYERS_PATH, None).await?;
    debug!(count = entries.len(), "listed lobby players");
    Ok(entries.into_iter().map(|e| e.name).collect())
}
