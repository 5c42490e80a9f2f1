use std::collections::HashMap;

use cozy_chess::Board;

use super::san::{parse_san, SanError};
use crate::archive::{ArchivePly, GameRecord};
use crate::fen::{board_key, parse_fen, FenError};
use crate::types::GameResult;
use crate::uci::format_standard_uci;

/// A PGN game split into its tag pairs and movetext.
#[derive(Debug, Clone, Default)]
pub struct PgnGame {
    pub tags: HashMap<String, String>,
    pub movetext: String,
}

/// A movetext move with the clock from the comment that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct PgnMove {
    pub san: String,
    pub clock_seconds: Option<f64>,
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<&str, PgnError> {
        self.tag(name).ok_or(PgnError::MissingHeader(name))
    }

    /// External id: last path segment of `Link`, falling back to `GameId`.
    pub fn game_id(&self) -> Option<String> {
        self.tag("Link")
            .and_then(|link| link.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .or_else(|| self.tag("GameId"))
            .map(str::to_string)
    }

    /// Build the game header record. White, Black, Result and an id are
    /// required; everything else is optional.
    pub fn record(&self) -> Result<GameRecord, PgnError> {
        let game_id = self.game_id().ok_or(PgnError::MissingHeader("Link"))?;
        Ok(GameRecord {
            game_id,
            white: self.required("White")?.to_string(),
            black: self.required("Black")?.to_string(),
            white_rating: self.tag("WhiteElo").and_then(|v| v.parse().ok()),
            black_rating: self.tag("BlackElo").and_then(|v| v.parse().ok()),
            result: GameResult::parse(self.required("Result")?),
            occurred_at: self.occurred_at(),
            eco: self.tag("ECO").map(str::to_string),
            time_control: self.tag("TimeControl").map(str::to_string),
        })
    }

    fn occurred_at(&self) -> Option<String> {
        let date = self.tag("UTCDate").or_else(|| self.tag("Date"))?;
        if date.contains('?') {
            return None;
        }
        let date = date.replace('.', "-");
        match self.tag("UTCTime").or_else(|| self.tag("StartTime")) {
            Some(time) => Some(format!("{date} {time}")),
            None => Some(date),
        }
    }

    /// Replay the main line and produce one ply per move, each keyed by the
    /// position it was played from.
    pub fn plies(&self, game_id: &str) -> Result<Vec<ArchivePly>, PgnError> {
        let mut board = match self.tag("FEN") {
            Some(fen) => parse_fen(fen)?,
            None => Board::default(),
        };

        let moves = tokenize_movetext(&self.movetext)?;
        let mut plies = Vec::with_capacity(moves.len());
        for (index, pgn_move) in moves.into_iter().enumerate() {
            let mv = parse_san(&board, &pgn_move.san).map_err(|source| PgnError::San {
                ply: index + 1,
                source,
            })?;
            let fen = board_key(&board);
            let move_number = u32::from(board.fullmove_number());
            let move_uci = format_standard_uci(&board, mv);
            board
                .try_play(mv)
                .map_err(|_| PgnError::IllegalMove(pgn_move.san.clone()))?;

            plies.push(ArchivePly {
                game_id: game_id.to_string(),
                move_number,
                move_uci,
                move_san: pgn_move.san.trim_end_matches(['!', '?']).to_string(),
                clock_seconds: pgn_move.clock_seconds,
                fen,
            });
        }
        Ok(plies)
    }
}

/// Split a PGN archive into its games. A tag section that follows movetext
/// starts a new game.
pub fn split_games(text: &str) -> Vec<PgnGame> {
    let mut games = Vec::new();
    let mut current = PgnGame::default();
    let mut in_movetext = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.starts_with("[%") {
            if in_movetext {
                games.push(std::mem::take(&mut current));
                in_movetext = false;
            }
            if let Some((name, value)) = parse_tag(trimmed) {
                current.tags.insert(name, value);
            }
        } else {
            in_movetext = true;
            if !current.movetext.is_empty() {
                current.movetext.push('\n');
            }
            current.movetext.push_str(trimmed);
        }
    }

    if !current.tags.is_empty() || !current.movetext.is_empty() {
        games.push(current);
    }
    games
}

/// Parse `[Name "Value"]`.
fn parse_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    let (name, rest) = inner.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.replace("\\\"", "\"")))
}

/// Main-line SAN moves of a movetext section. Comments, variations, NAGs,
/// move numbers and the result token are dropped; `[%clk]` annotations are
/// attached to the preceding move.
pub fn tokenize_movetext(movetext: &str) -> Result<Vec<PgnMove>, PgnError> {
    let mut moves: Vec<PgnMove> = Vec::new();
    let mut chars = movetext.chars().peekable();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut comment = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => comment.push(ch),
                        None => return Err(PgnError::UnterminatedComment),
                    }
                }
                if variation_depth == 0 {
                    if let (Some(last), Some(clock)) = (moves.last_mut(), clock_from_comment(&comment)) {
                        last.clock_seconds = Some(clock);
                    }
                }
            }
            ';' => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
            }
            '(' => variation_depth += 1,
            ')' => {
                variation_depth = variation_depth
                    .checked_sub(1)
                    .ok_or(PgnError::InvalidFormat)?;
            }
            c if c.is_whitespace() => {}
            _ => {
                let mut token = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '{' | '}' | '(' | ')' | ';') {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                if variation_depth > 0 {
                    continue;
                }
                if let Some(san) = san_from_token(&token) {
                    moves.push(PgnMove {
                        san,
                        clock_seconds: None,
                    });
                }
            }
        }
    }

    if variation_depth != 0 {
        return Err(PgnError::InvalidFormat);
    }
    Ok(moves)
}

/// Strip a leading move number (`12.`, `12...`) and reject NAGs and result
/// tokens.
fn san_from_token(token: &str) -> Option<String> {
    if token.starts_with('$') || matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") {
        return None;
    }
    if token.starts_with("0-0") {
        return Some(token.to_string());
    }
    let san = token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    if san.is_empty() {
        return None;
    }
    Some(san.to_string())
}

/// Extract `[%clk h:mm:ss(.f)]` from a comment body, in seconds.
pub fn clock_from_comment(comment: &str) -> Option<f64> {
    let start = comment.find("[%clk")? + "[%clk".len();
    let rest = &comment[start..];
    let end = rest.find(']')?;
    parse_clock(rest[..end].trim())
}

/// `h:mm:ss`, `m:ss` or `ss`, with optional fractional seconds.
pub fn parse_clock(raw: &str) -> Option<f64> {
    let mut seconds = 0.0;
    for part in raw.split(':') {
        let value: f64 = part.parse().ok()?;
        seconds = seconds * 60.0 + value;
    }
    Some(seconds)
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Invalid PGN format")]
    InvalidFormat,
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),
    #[error("Invalid FEN header: {0}")]
    Fen(#[from] FenError),
    #[error("Unreadable move at ply {ply}: {source}")]
    San { ply: usize, source: SanError },
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Archive contains no games")]
    Empty,
}
