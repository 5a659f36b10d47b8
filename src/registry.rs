//! Players known to the client and their identity across turns.
//!
//! The server resends every visible player each turn. [`PlayerRegistry::reconcile`]
//! folds a fresh snapshot into the registry so that a player who stays in the
//! game keeps the same [`PlayerHandle`] and record, updated in place, while
//! players who vanished from the snapshot are dropped.

use std::collections::BTreeMap;

use crate::model::{Heading, Position, NO_PLAYER};
use crate::protocol::PlayerSnapshot;

/// Stable identity of a [`Player`] record inside a [`PlayerRegistry`].
///
/// A handle survives as long as the player keeps appearing under the same name.
/// Bots keep a handle instead of a reference and resolve it every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerHandle(u64);

/// Best-known data for one player, refreshed every turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    handle: PlayerHandle,
    /// Id used for this player in board cells.
    pub id: i32,
    /// Name as assigned by the server, which may differ from the requested one.
    pub name: String,
    /// Number of cells owned.
    pub score: i32,
    /// Current position, [`Position::UNKNOWN`] when out of view.
    pub pos: Position,
    /// Current heading, [`Heading::UNKNOWN`] when out of view.
    pub dir: Heading,
}

impl Player {
    fn new(handle: PlayerHandle, name: String) -> Self {
        Self {
            handle,
            id: NO_PLAYER,
            name,
            score: 0,
            pos: Position::UNKNOWN,
            dir: Heading::UNKNOWN,
        }
    }

    pub fn handle(&self) -> PlayerHandle {
        self.handle
    }

    /// Returns `true` if the player's position is currently visible.
    pub fn is_visible(&self) -> bool {
        self.pos.is_valid()
    }

    fn update(&mut self, snapshot: PlayerSnapshot) {
        self.id = snapshot.id;
        self.score = snapshot.score;
        self.pos = snapshot
            .pos
            .map_or(Position::UNKNOWN, |p| Position::new(p.x, p.y));
        self.dir = snapshot
            .dir
            .map_or(Heading::UNKNOWN, |d| Heading::new(d.x, d.y));
    }
}

/// Players of the current game, keyed by server-assigned name.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<String, Player>,
    next_handle: u64,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn get_by_handle(&self, handle: PlayerHandle) -> Option<&Player> {
        self.players.values().find(|p| p.handle == handle)
    }

    /// Find a player by board id. Linear scan.
    pub fn find_by_id(&self, id: i32) -> Option<&Player> {
        if id == NO_PLAYER {
            return None;
        }
        self.players.values().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Forget all players. Handles are never reused afterwards.
    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// Replace the registry contents with this turn's snapshot.
    ///
    /// Players whose name was already known keep their record and handle.
    /// Players missing from `snapshots` are dropped.
    pub fn reconcile(&mut self, snapshots: impl IntoIterator<Item = PlayerSnapshot>) {
        let mut previous = std::mem::take(&mut self.players);

        for snapshot in snapshots {
            let mut player = match previous
                .remove(&snapshot.name)
                .or_else(|| self.players.remove(&snapshot.name))
            {
                Some(player) => player,
                None => {
                    let handle = self.allocate_handle();
                    Player::new(handle, snapshot.name.clone())
                }
            };
            player.update(snapshot);
            self.players.insert(player.name.clone(), player);
        }

        if !previous.is_empty() {
            tracing::debug!(
                dropped = previous.len(),
                "players left view or the game"
            );
        }
    }

    fn allocate_handle(&mut self) -> PlayerHandle {
        let handle = PlayerHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}
