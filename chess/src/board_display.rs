//! Plain-text board rendering from FEN, for terminal front ends.

use crate::types::{PieceKind, PlayerSide};

/// An 8x8 board for display purposes only.
#[derive(Debug, Clone, Default)]
pub struct DisplayBoard {
    squares: [[Option<(PieceKind, PlayerSide)>; 8]; 8],
}

impl DisplayBoard {
    /// Read the piece placement field of `fen`. The other fields are ignored.
    pub fn from_fen(fen: &str) -> Result<Self, DisplayBoardError> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or(DisplayBoardError::InvalidFen)?;
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(DisplayBoardError::InvalidFen);
        }

        let mut board = DisplayBoard::default();
        // FEN lists rank 8 first
        for (row, rank) in rows.iter().zip((0..8).rev()) {
            let mut file = 0;
            for c in row.chars() {
                match c.to_digit(10) {
                    Some(run @ 1..=8) => file += run as usize,
                    Some(_) => return Err(DisplayBoardError::InvalidFen),
                    None => {
                        let kind = PieceKind::from_char(c).ok_or(DisplayBoardError::InvalidPiece(c))?;
                        let side = if c.is_ascii_uppercase() {
                            PlayerSide::White
                        } else {
                            PlayerSide::Black
                        };
                        let cell = board.squares[rank]
                            .get_mut(file)
                            .ok_or(DisplayBoardError::InvalidFen)?;
                        *cell = Some((kind, side));
                        file += 1;
                    }
                }
            }
            if file != 8 {
                return Err(DisplayBoardError::InvalidFen);
            }
        }
        Ok(board)
    }

    pub fn piece_at(&self, file: u8, rank: u8) -> Option<(PieceKind, PlayerSide)> {
        if file > 7 || rank > 7 {
            return None;
        }
        self.squares[rank as usize][file as usize]
    }

    /// Render as text from `orientation`'s point of view.
    ///
    /// Squares named in `highlights` (e.g. "e2") are bracketed.
    pub fn render(&self, orientation: PlayerSide, highlights: &[String]) -> String {
        let ranks: Vec<u8> = match orientation {
            PlayerSide::White => (0..8).rev().collect(),
            PlayerSide::Black => (0..8).collect(),
        };
        let files: Vec<u8> = match orientation {
            PlayerSide::White => (0..8).collect(),
            PlayerSide::Black => (0..8).rev().collect(),
        };

        let mut out = String::new();
        for &rank in &ranks {
            out.push_str(&format!("{} ", rank + 1));
            for &file in &files {
                let glyph = match self.piece_at(file, rank) {
                    Some((kind, PlayerSide::White)) => kind.to_char_upper(),
                    Some((kind, PlayerSide::Black)) => kind.to_char_lower(),
                    None => '.',
                };
                let name = format!("{}{}", (b'a' + file) as char, rank + 1);
                if highlights.contains(&name) {
                    out.push_str(&format!("[{glyph}]"));
                } else {
                    out.push_str(&format!(" {glyph} "));
                }
            }
            out.push('\n');
        }
        out.push_str("  ");
        for &file in &files {
            out.push_str(&format!(" {} ", (b'a' + file) as char));
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayBoardError {
    #[error("Invalid FEN string")]
    InvalidFen,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
}
