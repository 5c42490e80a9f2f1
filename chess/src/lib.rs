pub mod analysis;
pub mod archive;
pub mod fen;
pub mod pgn;
pub mod types;
pub mod uci;

pub use analysis::{is_white_ply, AnalysisScore, EVAL_CLAMP_CP, MATE_SCORE_CP};
pub use archive::{ArchivePly, GameArchive, GameRecord};
pub use fen::{
    board_key, format_fen, material_balance, parse_fen, position_key, side_to_move, with_counters,
    FenError, START_FEN,
};
pub use types::{GameResult, PieceKind, Side};
pub use uci::{format_standard_uci, format_uci_move};
