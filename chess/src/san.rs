//! Standard Algebraic Notation.

use cozy_chess::{Board, GameStatus, Move, Piece};

use crate::converters::{file_to_char, format_piece_upper, rank_to_char};
use crate::uci::{is_castle, legal_moves, parse_legal_uci};

/// Format a legal move as SAN, including disambiguation and check/mate suffix.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = san_without_suffix(board, mv);

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if after.status() == GameStatus::Won {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

fn san_without_suffix(board: &Board, mv: Move) -> String {
    if is_castle(board, mv) {
        return if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let piece = match board.piece_on(mv.from) {
        Some(p) => p,
        None => return crate::uci::format_uci_move(mv),
    };
    let is_capture = board.piece_on(mv.to).is_some()
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    let mut san = String::new();
    if piece == Piece::Pawn {
        if is_capture {
            san.push(file_to_char(mv.from.file()));
        }
    } else {
        san.push(format_piece_upper(piece));
        san.push_str(&disambiguation(board, mv, piece));
    }

    if is_capture {
        san.push('x');
    }
    san.push(file_to_char(mv.to.file()));
    san.push(rank_to_char(mv.to.rank()));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(format_piece_upper(promo));
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Move> = legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
                && !is_castle(board, *other)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|o| o.from.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|o| o.from.rank() == mv.from.rank());

    match (shares_file, shares_rank) {
        (false, _) => file_to_char(mv.from.file()).to_string(),
        (true, false) => rank_to_char(mv.from.rank()).to_string(),
        (true, true) => format!(
            "{}{}",
            file_to_char(mv.from.file()),
            rank_to_char(mv.from.rank())
        ),
    }
}

/// Strip annotations and check marks so user input compares with generated SAN.
fn normalize(san: &str) -> String {
    san.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
        .replace('=', "")
}

/// Parse Standard Algebraic Notation (SAN) move
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let matches: Vec<Move> = legal_moves(board)
        .into_iter()
        .filter(|mv| normalize(&san_without_suffix(board, *mv)) == wanted)
        .collect();

    match matches.as_slice() {
        [] => Err(SanError::NoLegalMove(san.to_string())),
        [mv] => Ok(*mv),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Parse a move written either as SAN or as UCI.
pub fn parse_move(board: &Board, text: &str) -> Result<Move, SanError> {
    match parse_san(board, text) {
        Ok(mv) => Ok(mv),
        Err(san_err) => parse_legal_uci(board, text).map_err(|_| san_err),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
