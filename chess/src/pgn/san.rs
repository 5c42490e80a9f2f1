use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// Resolve a Standard Algebraic Notation (SAN) move against the legal moves
/// of `board`.
///
/// Check/mate markers and annotation glyphs are ignored. Castling may be
/// written with letters or zeros. The returned move uses cozy_chess encoding,
/// so it can be played on `board` directly.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let cleaned = san.trim_end_matches(['+', '#', '!', '?']);
    if cleaned.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let legal = legal_moves(board);

    match cleaned {
        "O-O" | "0-0" => return find_castle(board, &legal, true, san),
        "O-O-O" | "0-0-0" => return find_castle(board, &legal, false, san),
        _ => {}
    }

    let (body, promotion) = split_promotion(cleaned)?;

    let (piece, rest) = match body.chars().next() {
        Some(c @ ('N' | 'B' | 'R' | 'Q' | 'K')) => (piece_from_char(c)?, &body[1..]),
        _ => (Piece::Pawn, body),
    };

    let rest: String = rest.chars().filter(|c| !matches!(c, 'x' | ':')).collect();
    if rest.len() < 2 {
        return Err(SanError::InvalidFormat(san.to_string()));
    }
    let (hint, dest) = rest.split_at(rest.len() - 2);
    let dest: Square = dest
        .parse()
        .map_err(|_| SanError::InvalidSquare(dest.to_string()))?;

    let mut file_hint = None;
    let mut rank_hint = None;
    for c in hint.chars() {
        match c {
            'a'..='h' => file_hint = Some(file_from_char(c)?),
            '1'..='8' => rank_hint = Some(rank_from_char(c)?),
            other => return Err(SanError::InvalidFile(other)),
        }
    }

    let side = board.side_to_move();
    let candidates: Vec<Move> = legal
        .into_iter()
        .filter(|mv| {
            board.piece_on(mv.from) == Some(piece)
                && mv.to == dest
                && board.color_on(mv.to) != Some(side)
                && mv.promotion == promotion
                && file_hint.map_or(true, |f| mv.from.file() == f)
                && rank_hint.map_or(true, |r| mv.from.rank() == r)
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(SanError::NoLegalMove(san.to_string())),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

fn find_castle(board: &Board, legal: &[Move], kingside: bool, san: &str) -> Result<Move, SanError> {
    let side = board.side_to_move();
    legal
        .iter()
        .copied()
        .find(|mv| {
            board.piece_on(mv.from) == Some(Piece::King)
                && board.piece_on(mv.to) == Some(Piece::Rook)
                && board.color_on(mv.to) == Some(side)
                && ((mv.to.file() as u8 > mv.from.file() as u8) == kingside)
        })
        .ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

fn split_promotion(san: &str) -> Result<(&str, Option<Piece>), SanError> {
    if let Some(idx) = san.find('=') {
        let promo = san[idx + 1..]
            .chars()
            .next()
            .ok_or_else(|| SanError::InvalidPromotion(san.to_string()))?;
        return Ok((&san[..idx], Some(promotion_from_char(promo, san)?)));
    }

    // Some exporters omit the '=' ("e8Q").
    let starts_with_file = san.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    if let Some(last) = san.chars().last() {
        if starts_with_file && matches!(last, 'N' | 'B' | 'R' | 'Q') && san.len() >= 3 {
            return Ok((&san[..san.len() - 1], Some(promotion_from_char(last, san)?)));
        }
    }

    Ok((san, None))
}

fn promotion_from_char(c: char, san: &str) -> Result<Piece, SanError> {
    match c.to_ascii_uppercase() {
        'N' => Ok(Piece::Knight),
        'B' => Ok(Piece::Bishop),
        'R' => Ok(Piece::Rook),
        'Q' => Ok(Piece::Queen),
        _ => Err(SanError::InvalidPromotion(san.to_string())),
    }
}

fn piece_from_char(c: char) -> Result<Piece, SanError> {
    match c {
        'N' => Ok(Piece::Knight),
        'B' => Ok(Piece::Bishop),
        'R' => Ok(Piece::Rook),
        'Q' => Ok(Piece::Queen),
        'K' => Ok(Piece::King),
        other => Err(SanError::InvalidFormat(other.to_string())),
    }
}

fn file_from_char(c: char) -> Result<File, SanError> {
    match c {
        'a' => Ok(File::A),
        'b' => Ok(File::B),
        'c' => Ok(File::C),
        'd' => Ok(File::D),
        'e' => Ok(File::E),
        'f' => Ok(File::F),
        'g' => Ok(File::G),
        'h' => Ok(File::H),
        other => Err(SanError::InvalidFile(other)),
    }
}

fn rank_from_char(c: char) -> Result<Rank, SanError> {
    match c {
        '1' => Ok(Rank::First),
        '2' => Ok(Rank::Second),
        '3' => Ok(Rank::Third),
        '4' => Ok(Rank::Fourth),
        '5' => Ok(Rank::Fifth),
        '6' => Ok(Rank::Sixth),
        '7' => Ok(Rank::Seventh),
        '8' => Ok(Rank::Eighth),
        other => Err(SanError::InvalidRank(other)),
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid file: {0}")]
    InvalidFile(char),
    #[error("Invalid rank: {0}")]
    InvalidRank(char),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}
