//! A bot that walks in squares, growing them until it hits the board edge.
//!
//! Configured from the environment:
//!
//! | Variable            | Default     |
//! |---------------------|-------------|
//! | `KERFUFFLE_HOST`    | `localhost` |
//! | `KERFUFFLE_PORT`    | `8080`      |
//! | `KERFUFFLE_BOT`     | `circler`   |
//! | `KERFUFFLE_GAMES`   | unlimited   |
//! | `RUST_LOG`          | `info`      |
//!
//! ```text
//! RUST_LOG=kerfuffle_client=debug cargo run --example circle_bot
//! ```

use kerfuffle_client::{
    Bot, Direction, GameState, HttpTransport, KerfuffleClient, KerfuffleConfig, Moves,
    PlayerHandle, Position,
};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

struct CircleBot {
    me: Option<PlayerHandle>,
    heading: Direction,
    side: usize,
    walked: usize,
    board_width: i32,
    board_height: i32,
}

impl CircleBot {
    fn new() -> Self {
        Self {
            me: None,
            heading: Direction::Right,
            side: 2,
            walked: 0,
            board_width: 0,
            board_height: 0,
        }
    }

    fn on_board(&self, pos: Position) -> bool {
        pos.is_valid() && pos.x < self.board_width && pos.y < self.board_height
    }
}

impl Bot for CircleBot {
    fn init(&mut self, board_width: i32, board_height: i32) {
        info!(board_width, board_height, "new game");
        *self = Self {
            board_width,
            board_height,
            ..Self::new()
        };
    }

    fn bind_player(&mut self, player: Option<PlayerHandle>) {
        self.me = player;
    }

    fn get_moves(&mut self, state: &GameState) -> Moves {
        let mut pos = self
            .me
            .and_then(|h| state.players.get_by_handle(h))
            .map_or(Position::UNKNOWN, |p| p.pos);

        let mut moves = Moves::new();
        while moves.len() < Moves::PER_TURN {
            if self.walked == self.side {
                self.heading = self.heading.turn_right();
                self.walked = 0;
                if self.heading == Direction::Right {
                    self.side += 1;
                }
            }
            let next = pos.step(self.heading);
            if pos.is_valid() && !next.is_some_and(|p| self.on_board(p)) {
                // Start a fresh, smaller square away from the edge.
                self.heading = self.heading.turn_right();
                self.walked = 0;
                self.side = 2;
            }
            moves.push(self.heading);
            if pos.is_valid() {
                pos = pos.step(self.heading).unwrap_or(Position::UNKNOWN);
            }
            self.walked += 1;
        }
        moves
    }

    fn game_over(&mut self, _state: &GameState) {
        debug!(largest_side = self.side, "game over");
    }
}

fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[tokio::main]
async fn main() {
    initialize_logging();

    let host = env_or("KERFUFFLE_HOST", "localhost");
    let port: u16 = env_or("KERFUFFLE_PORT", "8080").parse().unwrap_or(8080);
    let mut config = KerfuffleConfig::new(env_or("KERFUFFLE_BOT", "circler"));
    if let Some(games) = std::env::var("KERFUFFLE_GAMES")
        .ok()
        .and_then(|g| g.parse().ok())
    {
        config = config.with_game_limit(games);
    }

    info!(%host, port, bot = %config.bot_name, "starting");
    let mut client = KerfuffleClient::new(HttpTransport::new(host, port), config);
    client.play(&mut CircleBot::new()).await;
}
