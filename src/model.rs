//! Game-state data model shared by the decoder, the registry and bots.
//!
//! Every id on the board is a player id or [`NO_PLAYER`]. Coordinates that the
//! server did not report carry [`UNKNOWN_POS`] on both axes.

use serde::{Deserialize, Serialize};

use crate::registry::{Player, PlayerRegistry};

/// Sentinel id for "no player" in board cells and player ids.
pub const NO_PLAYER: i32 = -1;

/// Sentinel coordinate for "not currently visible".
pub const UNKNOWN_POS: i32 = -1;

// ── Coordinates ─────────────────────────────────────────────────────

/// A cell coordinate. Either axis may be [`UNKNOWN_POS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// A position the server did not report.
    pub const UNKNOWN: Self = Self {
        x: UNKNOWN_POS,
        y: UNKNOWN_POS,
    };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `true` if neither axis is the unknown sentinel.
    pub fn is_valid(&self) -> bool {
        self.x != UNKNOWN_POS && self.y != UNKNOWN_POS
    }

    /// The position one step away in `direction`, or `None` if that leaves
    /// the `i32` range.
    #[must_use]
    pub fn step(&self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.delta();
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// One of the four moves a bot can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, clockwise from `Up`.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit vector for this direction. `y` grows downwards.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The direction matching a unit vector, if any.
    pub fn from_delta(x: i32, y: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.delta() == (x, y))
    }

    #[must_use]
    pub fn turn_right(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        self.turn_right().turn_right()
    }
}

/// Directions go on the wire as `{"x": dx, "y": dy}`.
impl Serialize for Direction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (x, y) = self.delta();
        Position::new(x, y).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Position::deserialize(deserializer)?;
        Self::from_delta(raw.x, raw.y).ok_or_else(|| {
            serde::de::Error::custom(format!("({}, {}) is not a unit direction", raw.x, raw.y))
        })
    }
}

/// The raw heading reported for a player.
///
/// Unlike [`Direction`] this can represent "unknown" (both axes
/// [`UNKNOWN_POS`]) and whatever vector the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Heading {
    pub x: i32,
    pub y: i32,
}

impl Heading {
    pub const UNKNOWN: Self = Self {
        x: UNKNOWN_POS,
        y: UNKNOWN_POS,
    };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }

    /// The matching [`Direction`] if this heading is a unit vector.
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_delta(self.x, self.y)
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl From<Direction> for Heading {
    fn from(direction: Direction) -> Self {
        let (x, y) = direction.delta();
        Self::new(x, y)
    }
}

// ── Moves ───────────────────────────────────────────────────────────

/// The moves a bot submits for one turn.
///
/// The server plays at most [`Moves::PER_TURN`] entries; a shorter list keeps
/// going in the last direction for the rest of the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Moves(Vec<Direction>);

impl Moves {
    /// Number of moves the server plays per turn.
    pub const PER_TURN: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, direction: Direction) {
        self.0.push(direction);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Direction] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Direction> {
        self.0.iter()
    }
}

impl From<Vec<Direction>> for Moves {
    fn from(moves: Vec<Direction>) -> Self {
        Self(moves)
    }
}

impl FromIterator<Direction> for Moves {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Boards ──────────────────────────────────────────────────────────

/// A rectangular grid of owner and trail ids, stored row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    /// Who owns each cell.
    pub owner_ids: Vec<i32>,
    /// Whose trail is trying to claim each cell.
    pub trail_ids: Vec<i32>,
}

impl Board {
    /// A board of the given size with every cell set to [`NO_PLAYER`].
    pub fn empty(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            owner_ids: vec![NO_PLAYER; cells],
            trail_ids: vec![NO_PLAYER; cells],
        }
    }

    /// Row-major index of `(x, y)`, or `None` when outside the grid.
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn owner_id(&self, x: i32, y: i32) -> Option<i32> {
        self.index(x, y)
            .and_then(|i| self.owner_ids.get(i))
            .copied()
    }

    pub fn trail_id(&self, x: i32, y: i32) -> Option<i32> {
        self.index(x, y)
            .and_then(|i| self.trail_ids.get(i))
            .copied()
    }

    /// Drop both grids, leaving a 0×0 board.
    pub fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.owner_ids.clear();
        self.trail_ids.clear();
    }
}

/// The slice of the full board visible to the bot this turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialBoard {
    pub board: Board,
    /// Top-left corner of `board` in full-board coordinates.
    pub board_offset: Position,
}

impl PartialBoard {
    /// Owner of the cell at full-board coordinates `pos`, if it is in view.
    pub fn owner_at(&self, pos: Position) -> Option<i32> {
        let local = self.to_local(pos)?;
        self.board.owner_id(local.x, local.y)
    }

    /// Trail on the cell at full-board coordinates `pos`, if it is in view.
    pub fn trail_at(&self, pos: Position) -> Option<i32> {
        let local = self.to_local(pos)?;
        self.board.trail_id(local.x, local.y)
    }

    fn to_local(&self, pos: Position) -> Option<Position> {
        if !pos.is_valid() || !self.board_offset.is_valid() {
            return None;
        }
        Some(Position::new(
            pos.x.checked_sub(self.board_offset.x)?,
            pos.y.checked_sub(self.board_offset.y)?,
        ))
    }
}

// ── Game state ──────────────────────────────────────────────────────

/// Everything the bot knows about the game it is playing.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    /// Width of the entire board. Constant for a game.
    pub board_width: i32,
    /// Height of the entire board. Constant for a game.
    pub board_height: i32,
    pub partial_board: PartialBoard,
    pub players: PlayerRegistry,
    pub game_over: bool,
    /// Milliseconds left in the game, when the server reports it.
    ///
    /// The stock server only sends `timeLeft` on its spectator status feed, so
    /// this stays `None` during normal play.
    pub time_left: Option<f64>,
    /// Canonical name the lobby assigned to this bot.
    pub bot_name: String,
}

impl GameState {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            ..Default::default()
        }
    }

    /// The bot's own player, if the server reported it this turn.
    pub fn me(&self) -> Option<&Player> {
        self.players.get(&self.bot_name)
    }

    /// Forget everything about the previous game. Keeps the bot name.
    pub fn reset(&mut self) {
        self.board_width = 0;
        self.board_height = 0;
        self.partial_board = PartialBoard::default();
        self.players.clear();
        self.game_over = false;
        self.time_left = None;
    }

    /// Clear board and player data once the game is over.
    pub(crate) fn finish(&mut self) {
        self.game_over = true;
        self.players.clear();
        self.partial_board.board.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_unit_vectors() {
        for d in Direction::ALL {
            let (x, y) = d.delta();
            assert_eq!(x.abs() + y.abs(), 1, "{d:?}");
            assert_eq!(Direction::from_delta(x, y), Some(d));
        }
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn direction_serializes_as_coordinate() {
        let json = serde_json::to_string(&Direction::Right).unwrap();
        assert_eq!(json, r#"{"x":1,"y":0}"#);
        let back: Direction = serde_json::from_str(r#"{"x":0,"y":1}"#).unwrap();
        assert_eq!(back, Direction::Down);
        assert!(serde_json::from_str::<Direction>(r#"{"x":1,"y":1}"#).is_err());
    }

    #[test]
    fn moves_serialize_as_array() {
        let moves: Moves = vec![Direction::Up, Direction::Left].into();
        let json = serde_json::to_string(&moves).unwrap();
        assert_eq!(json, r#"[{"x":0,"y":-1},{"x":-1,"y":0}]"#);
        assert_eq!(serde_json::to_string(&Moves::new()).unwrap(), "[]");
    }

    #[test]
    fn unknown_position_is_invalid() {
        assert!(!Position::UNKNOWN.is_valid());
        assert!(!Position::new(3, UNKNOWN_POS).is_valid());
        assert!(Position::new(0, 0).is_valid());
        assert_eq!(
            Position::new(2, 2).step(Direction::Up),
            Some(Position::new(2, 1))
        );
    }

    #[test]
    fn heading_maps_to_direction_when_unit() {
        assert_eq!(Heading::new(0, 1).direction(), Some(Direction::Down));
        assert_eq!(Heading::UNKNOWN.direction(), None);
        assert!(!Heading::default().is_known());
    }

    #[test]
    fn board_lookup_is_bounds_checked() {
        let mut board = Board::empty(3, 2);
        board.owner_ids[4] = 7;
        assert_eq!(board.owner_id(1, 1), Some(7));
        assert_eq!(board.owner_id(3, 0), None);
        assert_eq!(board.owner_id(-1, 0), None);
        assert_eq!(board.trail_id(2, 1), Some(NO_PLAYER));
    }

    #[test]
    fn partial_board_translates_full_board_coordinates() {
        let mut board = Board::empty(2, 2);
        board.trail_ids[3] = 5;
        let view = PartialBoard {
            board,
            board_offset: Position::new(10, 20),
        };
        assert_eq!(view.trail_at(Position::new(11, 21)), Some(5));
        assert_eq!(view.owner_at(Position::new(9, 20)), None);

        let blind = PartialBoard {
            board_offset: Position::UNKNOWN,
            ..view
        };
        assert_eq!(blind.trail_at(Position::new(11, 21)), None);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let view = PartialBoard {
            board: Board::empty(2, 2),
            board_offset: Position::new(10, 20),
        };
        assert_eq!(view.owner_at(Position::new(i32::MIN, 20)), None);
        assert_eq!(view.trail_at(Position::new(10, i32::MIN)), None);

        let far = PartialBoard {
            board: Board::empty(2, 2),
            board_offset: Position::new(i32::MIN, 0),
        };
        assert_eq!(far.owner_at(Position::new(i32::MAX, 0)), None);

        assert_eq!(Position::new(i32::MAX, 0).step(Direction::Right), None);
        assert_eq!(Position::new(0, i32::MIN).step(Direction::Up), None);
        assert_eq!(
            Position::new(i32::MAX, 0).step(Direction::Left),
            Some(Position::new(i32::MAX - 1, 0))
        );
    }

    #[test]
    fn finish_clears_board_and_players() {
        let mut state = GameState::new("bot");
        state.partial_board.board = Board::empty(4, 4);
        state.finish();
        assert!(state.game_over);
        assert!(state.partial_board.board.owner_ids.is_empty());
        assert!(state.partial_board.board.trail_ids.is_empty());
        assert!(state.players.is_empty());
    }
}
