//! The decision-making capability the client drives.
//!
//! Implement [`Bot`] and hand it to
//! [`KerfuffleClient::play`](crate::client::KerfuffleClient::play). The client
//! calls [`init`](Bot::init) and [`bind_player`](Bot::bind_player) once per
//! game, then [`get_moves`](Bot::get_moves) once per turn with the state
//! observed after the previous turn.
//!
//! # Example
//!
//! ```
//! use kerfuffle_client::bot::Bot;
//! use kerfuffle_client::model::{Direction, GameState, Moves};
//!
//! struct Straight;
//!
//! impl Bot for Straight {
//!     fn get_moves(&mut self, _state: &GameState) -> Moves {
//!         vec![Direction::Right; Moves::PER_TURN].into()
//!     }
//! }
//! ```

use crate::model::{GameState, Moves};
use crate::registry::PlayerHandle;

/// A bot that plays Kerfuffle games.
pub trait Bot: Send {
    /// Called once at the start of each game with the full board size.
    fn init(&mut self, _board_width: i32, _board_height: i32) {}

    /// Called once per game with the handle of the bot's own player, or `None`
    /// if the first snapshot did not include it.
    ///
    /// The handle stays valid while the server keeps reporting the player;
    /// resolve it with [`PlayerRegistry::get_by_handle`](crate::registry::PlayerRegistry::get_by_handle).
    fn bind_player(&mut self, _player: Option<PlayerHandle>) {}

    /// Choose the moves for the next turn.
    ///
    /// Return up to [`Moves::PER_TURN`] moves. Fewer keeps the bot going in its
    /// last direction; extra moves are ignored by the server.
    fn get_moves(&mut self, state: &GameState) -> Moves;

    /// Called once when the server reports the game over. Board and player data
    /// in `state` are already cleared.
    fn game_over(&mut self, _state: &GameState) {}
}

impl<B: Bot + ?Sized> Bot for Box<B> {
    fn init(&mut self, board_width: i32, board_height: i32) {
        (**self).init(board_width, board_height);
    }

    fn bind_player(&mut self, player: Option<PlayerHandle>) {
        (**self).bind_player(player);
    }

    fn get_moves(&mut self, state: &GameState) -> Moves {
        (**self).get_moves(state)
    }

    fn game_over(&mut self, state: &GameState) {
        (**self).game_over(state);
    }
}
