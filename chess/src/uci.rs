//! UCI (Universal Chess Interface) move notation

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::converters::{format_piece, format_square, parse_piece, parse_square};

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// Returns the matching legal move if `mv` is a castle in UCI form, otherwise
/// `mv` unchanged.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let target_square = match (mv.from.rank(), mv.to.file()) {
            (Rank::First, File::G) => Square::new(File::H, Rank::First),
            (Rank::First, File::C) => Square::new(File::A, Rank::First),
            (Rank::Eighth, File::G) => Square::new(File::H, Rank::Eighth),
            (Rank::Eighth, File::C) => Square::new(File::A, Rank::Eighth),
            _ => return mv,
        };

        let converted = Move {
            from: mv.from,
            to: target_square,
            promotion: None,
        };

        if legal_moves.contains(&converted) && !legal_moves.contains(&mv) {
            return converted;
        }
    }

    mv
}

/// True if `mv` is a castle in cozy_chess (king-captures-own-rook) form.
pub fn is_castle(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.colors(board.side_to_move()).has(mv.to)
}

/// Format a move in raw UCI notation (e.g., "e2e4", "e7e8q")
///
/// Castles are written the way cozy_chess stores them (e1h1); use
/// [`format_uci_standard`] for engine-facing output.
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Format a move as standard UCI, writing castles as the king's two-square hop.
pub fn format_uci_standard(board: &Board, mv: Move) -> String {
    if is_castle(board, mv) {
        let file = if mv.to.file() as u8 > mv.from.file() as u8 {
            File::G
        } else {
            File::C
        };
        let to = Square::new(file, mv.from.rank());
        return format!("{}{}", format_square(mv.from), format_square(to));
    }
    format_uci_move(mv)
}

/// Parse "e2e4" / "e7e8q" into a move without checking legality.
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    let s = s.trim();
    if !(4..=5).contains(&s.len()) || !s.is_ascii() {
        return Err(UciMoveError::InvalidFormat(s.to_string()));
    }
    let from = parse_square(&s[0..2]).ok_or_else(|| UciMoveError::InvalidSquare(s[0..2].into()))?;
    let to = parse_square(&s[2..4]).ok_or_else(|| UciMoveError::InvalidSquare(s[2..4].into()))?;
    let promotion = match s[4..].chars().next() {
        Some(c) => match parse_piece(c) {
            Some(p @ (Piece::Knight | Piece::Bishop | Piece::Rook | Piece::Queen)) => Some(p),
            _ => return Err(UciMoveError::InvalidPromotion(c)),
        },
        None => None,
    };
    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse a UCI move and resolve it against `board`, accepting both castling forms.
pub fn parse_legal_uci(board: &Board, s: &str) -> Result<Move, UciMoveError> {
    let mv = parse_uci_move(s)?;
    let legal = legal_moves(board);
    let converted = convert_uci_castling_to_cozy(mv, &legal);
    if legal.contains(&converted) {
        Ok(converted)
    } else {
        Err(UciMoveError::Illegal(s.to_string()))
    }
}

/// All legal moves in `board`.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

#[derive(Debug, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid UCI move: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(char),
    #[error("Illegal move in this position: {0}")]
    Illegal(String),
}
