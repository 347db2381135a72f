use chess::parse_move;
use cozy_chess::{Board, Square};

use crate::model::HintLevel;

/// Squares to highlight for a hint about `next_move` on `board`.
///
/// `Piece` points at the piece that should move; `Move` adds its destination.
/// Nothing is returned when the move does not parse on this board.
pub fn hint_squares(board: &Board, next_move: &str, level: HintLevel) -> Vec<Square> {
    if level == HintLevel::None {
        return Vec::new();
    }
    let Ok(mv) = parse_move(board, next_move) else {
        tracing::debug!("Hint move {} does not parse on the current board", next_move);
        return Vec::new();
    };
    match level {
        HintLevel::None => Vec::new(),
        HintLevel::Piece => vec![mv.from],
        HintLevel::Move => vec![mv.from, mv.to],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_levels() {
        let board = Board::default();
        assert!(hint_squares(&board, "Nf3", HintLevel::None).is_empty());
        assert_eq!(hint_squares(&board, "Nf3", HintLevel::Piece), vec![Square::G1]);
        assert_eq!(
            hint_squares(&board, "g1f3", HintLevel::Move),
            vec![Square::G1, Square::F3]
        );
    }

    #[test]
    fn test_unplayable_hint_is_empty() {
        assert!(hint_squares(&Board::default(), "Nf6", HintLevel::Move).is_empty());
    }
}
