use cozy_chess::Board;

use crate::types::PlayerSide;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(FenError::InvalidFormat);
    }

    fen.trim().parse().map_err(|_| FenError::InvalidFormat)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// The position-identifying part of a FEN: piece placement and side to move.
///
/// Move counters, castling rights and en passant are ignored, so two FENs that
/// only differ in clocks compare equal.
pub fn fen_key(fen: &str) -> Option<(&str, &str)> {
    let mut fields = fen.split_whitespace();
    let placement = fields.next()?;
    let side = fields.next()?;
    Some((placement, side))
}

/// True when both FENs describe the same placement with the same side to move.
pub fn same_position(a: &str, b: &str) -> bool {
    match (fen_key(a), fen_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Side to move according to the second FEN field.
pub fn side_to_move(fen: &str) -> Result<PlayerSide, FenError> {
    match fen_key(fen) {
        Some((_, "w")) => Ok(PlayerSide::White),
        Some((_, "b")) => Ok(PlayerSide::Black),
        Some((_, other)) => Err(FenError::InvalidSideToMove(other.to_string())),
        None => Err(FenError::InvalidFormat),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid side to move: {0}")]
    InvalidSideToMove(String),
}
