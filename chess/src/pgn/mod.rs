//! PGN archive reader.
//!
//! Turns chess.com-style PGN text into a [`GameArchive`]. Move legality and
//! application are delegated to cozy_chess.

mod parser;
mod san;

pub use parser::{
    clock_from_comment, parse_clock, split_games, tokenize_movetext, PgnError, PgnGame, PgnMove,
};
pub use san::{parse_san, SanError};

use crate::archive::GameArchive;

/// A game that could not be read, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedGame {
    /// 0-based position of the game within the archive.
    pub index: usize,
    pub game_id: Option<String>,
    pub reason: String,
}

/// The readable part of an archive plus the games that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedArchive {
    pub archive: GameArchive,
    pub skipped: Vec<SkippedGame>,
}

/// Read a PGN archive.
///
/// In an archive with several games, unreadable games are skipped and listed
/// in [`ParsedArchive::skipped`]. An archive holding a single game fails with
/// that game's error instead.
pub fn parse_archive(text: &str) -> Result<ParsedArchive, PgnError> {
    let games = split_games(text);
    if games.is_empty() {
        return Err(PgnError::Empty);
    }

    let single = games.len() == 1;
    let mut parsed = ParsedArchive::default();
    for (index, game) in games.iter().enumerate() {
        match read_game(game) {
            Ok((record, plies)) => parsed.archive.push_game(record, plies),
            Err(err) if single => return Err(err),
            Err(err) => parsed.skipped.push(SkippedGame {
                index,
                game_id: game.game_id(),
                reason: err.to_string(),
            }),
        }
    }
    Ok(parsed)
}

fn read_game(
    game: &PgnGame,
) -> Result<(crate::archive::GameRecord, Vec<crate::archive::ArchivePly>), PgnError> {
    let record = game.record()?;
    let plies = game.plies(&record.game_id)?;
    Ok((record, plies))
}
