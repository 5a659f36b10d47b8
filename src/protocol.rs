//! Wire-compatible JSON payloads for the Kerfuffle game server.
//!
//! Field names follow the server's camelCase. Unknown fields are ignored so
//! newer servers can add data without breaking the client.

use serde::{Deserialize, Deserializer, Serialize};

// ── Paths ───────────────────────────────────────────────────────────

/// Lobby registration and player listing.
pub const PLAYERS_PATH: &str = "/players";

/// Game listing; individual games live below it.
pub const GAMES_PATH: &str = "/games";

/// Path of the turn endpoint for `game_name`.
pub fn game_path(game_name: &str) -> String {
    format!("{GAMES_PATH}/{}", crate::uri::encode_path_segment(game_name))
}

// ── Requests ────────────────────────────────────────────────────────

/// Body of `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinLobbyRequest {
    /// Requested bot name. The server may hand back a different one.
    pub name: String,
    /// Whether the bot stays registered between games.
    pub persistent: bool,
}

// ── Responses ───────────────────────────────────────────────────────

/// Response to `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinLobbyResponse {
    /// Canonical bot name.
    pub name: String,
    /// Bearer token for authenticated calls.
    pub token: String,
}

/// An entry of `GET /players` or `GET /games`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedEntry {
    pub name: String,
}

/// A raw `{x, y}` pair as sent by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

/// One player as reported in a turn response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub name: String,
    pub id: i32,
    pub score: i32,
    /// Absent while the player is out of view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Coordinate>,
    /// Absent while the player is out of view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<Coordinate>,
}

/// A turn response that parsed as a JSON object.
///
/// Every field is optional on the wire; see the defaults on each field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    /// The game has ended. Defaults to `false`, also when not a boolean.
    #[serde(default, deserialize_with = "or_default")]
    pub over: bool,
    /// Full board width. Defaults to 0, also when not an integer.
    #[serde(default, deserialize_with = "or_default")]
    pub board_width: i32,
    /// Full board height. Defaults to 0, also when not an integer.
    #[serde(default, deserialize_with = "or_default")]
    pub board_height: i32,
    /// Top-left of the visible slice in full-board coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_origin: Option<Coordinate>,
    /// Milliseconds until the game deadline. Absent from player turns on the
    /// stock server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerSnapshot>>,
    /// Rows of `"<owner>,<trail>"` cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Vec<String>>>,
}

/// Deserialize `T`, falling back to `T::default()` when the value has another
/// type (`null`, `10.0` for an integer, ...).
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Classification of a raw turn response body.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnReply {
    /// The body is a JSON object.
    State(Box<TurnResponse>),
    /// The body is not a JSON object (`"Not Found"`, an error string, ...).
    /// The game ended without this client seeing `over`.
    Gone,
}

impl TurnReply {
    /// Classify a turn response body.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body is an object whose fields have
    /// the wrong types.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => {
                Ok(Self::State(Box::new(serde_json::from_value(value)?)))
            }
            _ => Ok(Self::Gone),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn game_path_encodes_name() {
        assert_eq!(game_path("My Game!"), "/games/My%20Game%21");
        assert_eq!(game_path("g1"), "/games/g1");
    }

    #[test]
    fn non_objects_are_gone() {
        for body in ["\"Not Found\"", "Not Found", "", "[]", "null", "42"] {
            assert_eq!(TurnReply::parse(body).unwrap(), TurnReply::Gone, "{body:?}");
        }
    }

    #[test]
    fn empty_object_uses_defaults() {
        let TurnReply::State(resp) = TurnReply::parse("{}").unwrap() else {
            panic!("expected state");
        };
        assert!(!resp.over);
        assert_eq!(resp.board_width, 0);
        assert!(resp.view_origin.is_none());
        assert!(resp.players.is_none());
        assert!(resp.board.is_none());
    }

    #[test]
    fn mistyped_scalars_fall_back_to_defaults() {
        let TurnReply::State(resp) =
            TurnReply::parse(r#"{"over": null, "boardWidth": 10.0, "boardHeight": "8"}"#)
                .unwrap()
        else {
            panic!("expected state");
        };
        assert!(!resp.over);
        assert_eq!((resp.board_width, resp.board_height), (0, 0));

        let TurnReply::State(resp) =
            TurnReply::parse(r#"{"over": "yes", "boardWidth": 12}"#).unwrap()
        else {
            panic!("expected state");
        };
        assert!(!resp.over);
        assert_eq!(resp.board_width, 12);
    }

    #[test]
    fn mistyped_collections_are_errors() {
        assert!(TurnReply::parse(r#"{"players": "none"}"#).is_err());
        assert!(TurnReply::parse(r#"{"board": [[1, 2]]}"#).is_err());
    }
}
