//! The per-game turn protocol.
//!
//! [`TurnProtocol`] owns the [`GameState`] of the game being played and moves
//! through [`TurnPhase`]s:
//!
//! ```text
//! Joining ──► AwaitingFirstState ──► ProcessingTurn ──┐
//!    ▲                │    │           │    ▲         │
//!    │                │    │           │    └─────────┘
//!    │                │    └── over ───┴─ over ──► GameOver
//!    └──── gone ──────┴────────────────┘ gone
//! ```
//!
//! `GameOver` holds until the next [`TurnProtocol::play_game`], which starts
//! again from `Joining`. Only a game that reached `ProcessingTurn` reports the
//! end to the bot.
//!
//! A game ends either with `over: true` ([`GameEnd::Finished`]) or with a
//! response that is not a JSON object ([`GameEnd::Abandoned`]), which the
//! server sends once a game it no longer knows about is addressed.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::board::decode_board;
use crate::bot::Bot;
use crate::connection::ConnectionManager;
use crate::discovery::{join_first_available_game, DEFAULT_POLL_INTERVAL};
use crate::error::{KerfuffleError, Result};
use crate::lobby::Credentials;
use crate::model::{GameState, Moves, Position};
use crate::protocol::{game_path, TurnReply};
use crate::registry::Player;
use crate::transport::Transport;

/// Where the protocol is within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Looking for a game.
    Joining,
    /// Joined; waiting for the first snapshot.
    AwaitingFirstState,
    /// Exchanging moves for snapshots.
    ProcessingTurn,
    /// The server reported the game over.
    GameOver,
}

/// What one turn response meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The game goes on.
    Continue,
    /// The server reported `over: true`.
    GameOver,
    /// The response was not a JSON object: the game is gone.
    Abandoned,
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    /// Played through to `over: true`.
    Finished,
    /// The game disappeared before `over: true` was seen.
    Abandoned,
}

/// Drives one game at a time and owns its state.
#[derive(Debug)]
pub struct TurnProtocol {
    phase: TurnPhase,
    game_name: Option<String>,
    state: GameState,
    turns: u64,
    poll_interval: Duration,
}

impl TurnProtocol {
    /// Create a protocol for the bot registered as `bot_name`.
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            phase: TurnPhase::Joining,
            game_name: None,
            state: GameState::new(bot_name),
            turns: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the delay between game-list polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Name of the game being played, once one was picked.
    pub fn game_name(&self) -> Option<&str> {
        self.game_name.as_deref()
    }

    /// Number of responses applied in the current game.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Fold one turn response body into the game state.
    ///
    /// Does not change the phase; [`play_game`](Self::play_game) does.
    ///
    /// # Errors
    ///
    /// Returns [`KerfuffleError::Serialization`] for an object with mistyped
    /// fields and [`KerfuffleError::Decode`] for an undecodable board. The
    /// state may be partially updated when an error is returned.
    pub fn apply_response(&mut self, body: &str) -> Result<TurnOutcome> {
        let response = match TurnReply::parse(body)? {
            TurnReply::Gone => return Ok(TurnOutcome::Abandoned),
            TurnReply::State(response) => *response,
        };
        self.turns += 1;

        self.state.game_over = response.over;
        self.state.board_width = response.board_width;
        self.state.board_height = response.board_height;
        self.state.time_left = response.time_left;
        self.state.partial_board.board_offset = response
            .view_origin
            .map_or(Position::UNKNOWN, |o| Position::new(o.x, o.y));

        if response.over {
            self.state.finish();
            return Ok(TurnOutcome::GameOver);
        }

        if let Some(players) = response.players {
            self.state.players.reconcile(players);
        }
        if let Some(rows) = response.board {
            self.state.partial_board.board = decode_board(&rows)?;
        }

        Ok(TurnOutcome::Continue)
    }

    /// Find a game and play it to the end.
    ///
    /// # Errors
    ///
    /// Any error from discovery, the connection or decoding aborts the game and
    /// is returned; the caller decides whether to reconnect or look for
    /// another game.
    pub async fn play_game<T, B>(
        &mut self,
        conn: &mut ConnectionManager<T>,
        credentials: &Credentials,
        bot: &mut B,
    ) -> Result<GameEnd>
    where
        T: Transport,
        B: Bot + ?Sized,
    {
        self.phase = TurnPhase::Joining;
        self.game_name = None;
        self.turns = 0;
        self.state.reset();

        let game = join_first_available_game(conn, credentials, self.poll_interval).await?;
        let path = game_path(&game);
        self.game_name = Some(game);
        self.phase = TurnPhase::AwaitingFirstState;

        // An empty move list only observes.
        match self.submit(conn, credentials, &path, &Moves::new()).await? {
            TurnOutcome::Continue => {}
            TurnOutcome::Abandoned => return Ok(self.abandon()),
            TurnOutcome::GameOver => {
                self.phase = TurnPhase::GameOver;
                info!(game = ?self.game_name, "game was over before the first turn");
                return Ok(GameEnd::Finished);
            }
        }

        bot.init(self.state.board_width, self.state.board_height);
        let me = self.state.me().map(Player::handle);
        if me.is_none() {
            warn!(bot = %self.state.bot_name, "own player missing from first snapshot");
        }
        bot.bind_player(me);
        self.phase = TurnPhase::ProcessingTurn;

        loop {
            let moves = bot.get_moves(&self.state);
            if moves.len() > Moves::PER_TURN {
                warn!(
                    count = moves.len(),
                    "bot returned more moves than the server plays per turn"
                );
            }

            match self.submit(conn, credentials, &path, &moves).await? {
                TurnOutcome::Continue => {}
                TurnOutcome::Abandoned => return Ok(self.abandon()),
                TurnOutcome::GameOver => {
                    self.phase = TurnPhase::GameOver;
                    info!(game = ?self.game_name, turns = self.turns, "game over");
                    bot.game_over(&self.state);
                    return Ok(GameEnd::Finished);
                }
            }
        }
    }

    async fn submit<T: Transport>(
        &mut self,
        conn: &mut ConnectionManager<T>,
        credentials: &Credentials,
        path: &str,
        moves: &Moves,
    ) -> Result<TurnOutcome> {
        let response = conn.post_raw(path, moves, Some(&credentials.token)).await?;

        // A rejected token must not be mistaken for a vanished game.
        if matches!(response.status, 401 | 403) {
            return Err(KerfuffleError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        let outcome = self.apply_response(&response.body)?;
        debug!(turn = self.turns, ?outcome, "applied turn response");
        Ok(outcome)
    }

    fn abandon(&mut self) -> GameEnd {
        info!(
            game = ?self.game_name,
            "tried to play a game that just ended; joining the next one instead"
        );
        self.phase = TurnPhase::Joining;
        GameEnd::Abandoned
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::model::Heading;

    const TURN: &str = r#"{
        "over": false,
        "boardWidth": 50,
        "boardHeight": 40,
        "viewOrigin": {"x": 10, "y": 5},
        "timeLeft": 45000.0,
        "players": [
            {"name": "me", "id": 0, "score": 9, "pos": {"x": 11, "y": 6}, "dir": {"x": 1, "y": 0}},
            {"name": "Ada", "id": 1, "score": 4}
        ],
        "board": [["0,", ",1"], ["0,0", ","]]
    }"#;

    #[test]
    fn applies_players_board_and_origin() {
        let mut turn = TurnProtocol::new("me");
        assert_eq!(turn.apply_response(TURN).unwrap(), TurnOutcome::Continue);

        let state = turn.state();
        assert!(!state.game_over);
        assert_eq!((state.board_width, state.board_height), (50, 40));
        assert_eq!(state.partial_board.board_offset, Position::new(10, 5));
        assert_eq!(state.time_left, Some(45000.0));
        assert_eq!(state.players.len(), 2);

        let me = state.me().unwrap();
        assert_eq!(me.pos, Position::new(11, 6));
        assert_eq!(me.dir, Heading::new(1, 0));
        let ada = state.players.get("Ada").unwrap();
        assert!(!ada.is_visible());

        let board = &state.partial_board.board;
        assert_eq!((board.width, board.height), (2, 2));
        assert_eq!(board.owner_ids, vec![0, -1, 0, -1]);
        assert_eq!(board.trail_ids, vec![-1, 1, 0, -1]);
        assert_eq!(state.partial_board.owner_at(Position::new(10, 6)), Some(0));
        assert_eq!(turn.turns(), 1);
    }

    #[test]
    fn non_object_response_abandons_without_touching_state() {
        let mut turn = TurnProtocol::new("me");
        turn.apply_response(TURN).unwrap();

        for body in ["Not Found", "\"Not Found\"", "[]"] {
            assert_eq!(turn.apply_response(body).unwrap(), TurnOutcome::Abandoned);
        }
        assert_eq!(turn.state().players.len(), 2);
        assert_eq!(turn.turns(), 1);
    }

    #[test]
    fn game_over_clears_players_and_grids() {
        let mut turn = TurnProtocol::new("me");
        turn.apply_response(TURN).unwrap();

        let outcome = turn
            .apply_response(r#"{"over": true, "players": [{"name": "me", "id": 0, "score": 1}], "board": [["1,1"]]}"#)
            .unwrap();

        assert_eq!(outcome, TurnOutcome::GameOver);
        let state = turn.state();
        assert!(state.game_over);
        assert!(state.players.is_empty());
        assert!(state.partial_board.board.owner_ids.is_empty());
        assert!(state.partial_board.board.trail_ids.is_empty());
    }

    #[test]
    fn missing_view_origin_is_unknown() {
        let mut turn = TurnProtocol::new("me");
        turn.apply_response(TURN).unwrap();
        turn.apply_response(r#"{"boardWidth": 50, "boardHeight": 40}"#)
            .unwrap();
        assert_eq!(turn.state().partial_board.board_offset, Position::UNKNOWN);
        // Player turns normally carry no deadline.
        assert_eq!(turn.state().time_left, None);
        // Absent players and board leave the previous view in place.
        assert_eq!(turn.state().players.len(), 2);
        assert_eq!(turn.state().partial_board.board.width, 2);
    }

    #[test]
    fn players_keep_identity_between_responses() {
        let mut turn = TurnProtocol::new("me");
        turn.apply_response(TURN).unwrap();
        let ada = turn.state().players.get("Ada").unwrap().handle();

        turn.apply_response(
            r#"{"players": [{"name": "Ada", "id": 1, "score": 6, "pos": {"x": 3, "y": 3}}]}"#,
        )
        .unwrap();

        let state = turn.state();
        assert!(state.me().is_none());
        let after = state.players.get_by_handle(ada).unwrap();
        assert_eq!(after.score, 6);
        assert_eq!(after.pos, Position::new(3, 3));
    }

    #[test]
    fn bad_cell_is_a_decode_error() {
        let mut turn = TurnProtocol::new("me");
        let err = turn
            .apply_response(r#"{"board": [["1,-2"]]}"#)
            .unwrap_err();
        assert!(matches!(err, KerfuffleError::Decode(_)));
    }

    #[test]
    fn mistyped_field_is_a_serialization_error() {
        let mut turn = TurnProtocol::new("me");
        let err = turn.apply_response(r#"{"players": 3}"#).unwrap_err();
        assert!(matches!(err, KerfuffleError::Serialization(_)));
    }
}
