//! The ingest shape: games, the distinct users they reference and their
//! ordered plies.

use crate::types::GameResult;

/// Header data of one game, keyed by its externally assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub game_id: String,
    pub white: String,
    pub black: String,
    pub white_rating: Option<i32>,
    pub black_rating: Option<i32>,
    pub result: GameResult,
    /// `YYYY-MM-DD HH:MM:SS` when the source carries it.
    pub occurred_at: Option<String>,
    pub eco: Option<String>,
    pub time_control: Option<String>,
}

/// One ply as supplied by a game source.
///
/// `fen` is the position the move is played *from*; the mover is that
/// position's side to move.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivePly {
    pub game_id: String,
    pub move_number: u32,
    pub move_uci: String,
    pub move_san: String,
    pub clock_seconds: Option<f64>,
    pub fen: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameArchive {
    pub games: Vec<GameRecord>,
    /// Distinct usernames, in first-seen order.
    pub users: Vec<String>,
    /// Plies grouped by game, in play order within each game.
    pub plies: Vec<ArchivePly>,
}

impl GameArchive {
    /// Add a user unless already present.
    pub fn add_user(&mut self, username: &str) {
        if !self.users.iter().any(|u| u == username) {
            self.users.push(username.to_string());
        }
    }

    /// Append a game together with its plies and players.
    pub fn push_game(&mut self, game: GameRecord, plies: Vec<ArchivePly>) {
        self.add_user(&game.white);
        self.add_user(&game.black);
        self.games.push(game);
        self.plies.extend(plies);
    }

    pub fn plies_for<'a>(&'a self, game_id: &'a str) -> impl Iterator<Item = &'a ArchivePly> + 'a {
        self.plies.iter().filter(move |p| p.game_id == game_id)
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
