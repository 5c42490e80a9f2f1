//! UCI (Universal Chess Interface) move utilities

use cozy_chess::{Board, File, Move, Piece, Square};

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q").
///
/// Moves are printed as given. Use [`format_standard_uci`] for moves that come
/// out of cozy_chess move generation, which encodes castling differently.
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Format a legal move of `board` in standard UCI notation.
///
/// cozy_chess uses king-to-rook notation for castling (e1h1, e1a1, e8h8, e8a8),
/// while engines and game archives use the king's destination square
/// (e1g1, e1c1, e8g8, e8c8). Castling moves are converted; everything else is
/// formatted as-is.
pub fn format_standard_uci(board: &Board, mv: Move) -> String {
    let side = board.side_to_move();
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.piece_on(mv.to) == Some(Piece::Rook)
        && board.color_on(mv.to) == Some(side);

    if is_castle {
        let file = if mv.to.file() as u8 > mv.from.file() as u8 {
            File::G
        } else {
            File::C
        };
        let to = Square::new(file, mv.from.rank());
        return format_uci_move(Move {
            from: mv.from,
            to,
            promotion: None,
        });
    }

    format_uci_move(mv)
}

pub fn format_square(sq: Square) -> String {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    format!("{}{}", file, sq.rank() as u8 + 1)
}

pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}
