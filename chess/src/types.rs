//! Canonical side, piece and result types for the project.
//! cozy-chess types are internal implementation details.

use serde::{Deserialize, Serialize};

/// Project-owned piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// The side to move, or the side that played a ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl PieceKind {
    /// Parse a FEN piece letter, ignoring case.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }

    /// Conventional material value in pawns. Kings carry no material value.
    pub fn material_value(self) -> i32 {
        match self {
            Self::Pawn => 1,
            Self::Knight | Self::Bishop => 3,
            Self::Rook => 5,
            Self::Queen => 9,
            Self::King => 0,
        }
    }
}

impl Side {
    pub fn from_fen_char(c: char) -> Option<Self> {
        match c {
            'w' => Some(Self::White),
            'b' => Some(Self::Black),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// +1 for White, -1 for Black. Multiplying a White-relative score by this
    /// gives the score from this side's point of view.
    pub fn sign(self) -> i32 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// 1-indexed ply number of this side's move within full move `move_number`.
    pub fn ply_number(self, move_number: u32) -> u32 {
        match self {
            Self::White => 2 * move_number - 1,
            Self::Black => 2 * move_number,
        }
    }
}

/// Outcome of a game as recorded in its `Result` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWin,
    Draw,
    BlackWin,
    /// Anything that is not a decisive or drawn result (`*`, abandoned, ...).
    Other(String),
}

impl GameResult {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "1-0" => Self::WhiteWin,
            "1/2-1/2" => Self::Draw,
            "0-1" => Self::BlackWin,
            other => Self::Other(other.to_string()),
        }
    }

    /// The PGN result token used for storage.
    pub fn as_pgn(&self) -> &str {
        match self {
            Self::WhiteWin => "1-0",
            Self::Draw => "1/2-1/2",
            Self::BlackWin => "0-1",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
