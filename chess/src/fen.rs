//! FEN helpers.
//!
//! Positions are identified by their *position key*: the first four FEN
//! fields (placement, side to move, castling rights, en-passant target).
//! The halfmove clock and fullmove number are dropped so that the same
//! position reached at different points of different games collapses to a
//! single key.

use cozy_chess::Board;

use crate::types::{PieceKind, Side};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string (full, or a four-field position key) into a Board.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(FenError::InvalidFormat);
    }
    Board::from_fen(&with_counters(fen), false).map_err(|_| FenError::InvalidBoardLayout)
}

/// Format a Board as a full FEN string.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// Reduce a FEN to its position key, validating it on the way.
pub fn position_key(fen: &str) -> Result<String, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 || parts.len() > 6 {
        return Err(FenError::InvalidFormat);
    }
    validate_placement(parts[0])?;
    if parts[1].len() != 1 || Side::from_fen_char(parts[1].chars().next().unwrap_or(' ')).is_none()
    {
        return Err(FenError::InvalidSideToMove(parts[1].to_string()));
    }

    let key = parts[..4].join(" ");
    parse_fen(&key)?;
    Ok(key)
}

/// Position key of a board.
pub fn board_key(board: &Board) -> String {
    let fen = format_fen(board);
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Side to move encoded in a FEN or position key.
pub fn side_to_move(fen: &str) -> Result<Side, FenError> {
    let field = fen.split_whitespace().nth(1).ok_or(FenError::InvalidFormat)?;
    let mut chars = field.chars();
    match (chars.next().and_then(Side::from_fen_char), chars.next()) {
        (Some(side), None) => Ok(side),
        _ => Err(FenError::InvalidSideToMove(field.to_string())),
    }
}

/// Material balance in pawns from the placement field: White pieces count
/// positive, Black pieces negative. Digits, rank separators and kings add
/// nothing.
pub fn material_balance(fen: &str) -> i32 {
    let placement = fen.split_whitespace().next().unwrap_or_default();
    placement
        .chars()
        .filter_map(|c| {
            let value = PieceKind::from_char(c)?.material_value();
            Some(if c.is_ascii_uppercase() { value } else { -value })
        })
        .sum()
}

/// Append zeroed move counters to a four-field position key so that engines
/// and parsers expecting six fields accept it. Full FENs pass through.
pub fn with_counters(fen: &str) -> String {
    let fields = fen.split_whitespace().count();
    match fields {
        4 => format!("{} 0 1", fen.trim()),
        5 => format!("{} 1", fen.trim()),
        _ => fen.trim().to_string(),
    }
}

fn validate_placement(placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidPlacement(placement.to_string()));
    }
    for rank in ranks {
        let mut squares = 0u32;
        for c in rank.chars() {
            if let Some(d) = c.to_digit(10) {
                squares += d;
            } else if PieceKind::from_char(c).is_some() {
                squares += 1;
            } else {
                return Err(FenError::InvalidPlacement(placement.to_string()));
            }
        }
        if squares != 8 {
            return Err(FenError::InvalidPlacement(placement.to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid board layout")]
    InvalidBoardLayout,
    #[error("Invalid piece placement: {0}")]
    InvalidPlacement(String),
    #[error("Invalid side to move: {0}")]
    InvalidSideToMove(String),
}
