use cozy_chess::{Board, Color, GameStatus, Move, Piece, Square};

use crate::fen::{self, FenError};
use crate::san::{self, SanError};
use crate::types::PlayerSide;
use crate::uci;

/// Main game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    start_fen: String,
    orientation: PlayerSide,
}

/// One played move, with everything callers need to inspect it later.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,             // Piece that made the move
    pub piece_color: Color,       // Color of the piece that moved
    pub captured: Option<Piece>,  // Captured piece (None for en passant)
    pub promotion: Option<Piece>, // Promotion piece if any
    pub san: String,              // Standard Algebraic Notation
    pub uci: String,              // Long algebraic, castles as e1g1
    pub fen_before: String,
    pub fen: String, // FEN after this move
    pub is_check: bool,
    pub is_checkmate: bool,
}

/// Final result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Checkmate,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            start_fen: fen::STARTING_FEN.to_string(),
            orientation: PlayerSide::White,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = fen::parse_fen(fen)?;
        Ok(Self {
            start_fen: fen::format_fen(&position),
            position,
            history: Vec::new(),
            orientation: PlayerSide::White,
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.position.is_legal(mv) {
            return Err(GameError::IllegalMove(uci::format_uci_move(mv)));
        }

        let piece = self
            .position
            .piece_on(mv.from)
            .ok_or_else(|| GameError::IllegalMove(uci::format_uci_move(mv)))?;
        let piece_color = self.position.side_to_move();
        let captured = if uci::is_castle(&self.position, mv) {
            None
        } else {
            self.position.piece_on(mv.to)
        };

        // Notation has to be generated against the position before the move
        let san = san::format_san(&self.position, mv);
        let uci = uci::format_uci_standard(&self.position, mv);
        let fen_before = self.to_fen();

        self.position.play_unchecked(mv);

        let is_check = !self.position.checkers().is_empty();
        let entry = HistoryEntry {
            mv,
            from: mv.from,
            to: mv.to,
            piece,
            piece_color,
            captured,
            promotion: mv.promotion,
            san,
            uci,
            fen_before,
            fen: self.to_fen(),
            is_check,
            is_checkmate: is_check && self.position.status() == GameStatus::Won,
        };

        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Parse `text` as SAN or UCI and play it.
    pub fn make_move_str(&mut self, text: &str) -> Result<HistoryEntry, GameError> {
        let mv = san::parse_move(&self.position, text)?;
        self.make_move(mv)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<HistoryEntry, GameError> {
        let entry = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.position = fen::parse_fen(&entry.fen_before)?;
        Ok(entry)
    }

    /// Replace the position and clear history.
    pub fn load(&mut self, fen: &str, orientation: PlayerSide) -> Result<(), GameError> {
        let position = fen::parse_fen(fen)?;
        self.start_fen = fen::format_fen(&position);
        self.position = position;
        self.history.clear();
        self.orientation = orientation;
        Ok(())
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn orientation(&self) -> PlayerSide {
        self.orientation
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        fen::format_fen(&self.position)
    }

    /// Result and reason if the game is over, including draws cozy-chess does
    /// not track (repetition, insufficient material).
    pub fn outcome(&self) -> Option<(GameResult, EndReason)> {
        match self.position.status() {
            GameStatus::Won => {
                // The side to move has been mated
                let result = match self.position.side_to_move() {
                    Color::White => GameResult::BlackWins,
                    Color::Black => GameResult::WhiteWins,
                };
                return Some((result, EndReason::Checkmate));
            }
            GameStatus::Drawn => {
                let reason = if self.position.halfmove_clock() >= 100 {
                    EndReason::FiftyMoveRule
                } else {
                    EndReason::Stalemate
                };
                return Some((GameResult::Draw, reason));
            }
            GameStatus::Ongoing => {}
        }

        if self.is_threefold_repetition() {
            return Some((GameResult::Draw, EndReason::ThreefoldRepetition));
        }
        if self.is_insufficient_material() {
            return Some((GameResult::Draw, EndReason::InsufficientMaterial));
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    fn is_threefold_repetition(&self) -> bool {
        let current = repetition_key(&self.to_fen());
        let seen = self
            .history
            .iter()
            .filter(|entry| repetition_key(&entry.fen) == current)
            .count();
        let from_start = usize::from(repetition_key(&self.start_fen) == current);
        seen + from_start >= 3
    }

    fn is_insufficient_material(&self) -> bool {
        let board = &self.position;
        let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }
        let minors = (board.pieces(Piece::Knight) | board.pieces(Piece::Bishop)).len();
        minors <= 1
    }
}

/// Placement, side, castling and en passant: the fields that define a repetition.
fn repetition_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("FEN parse error: {0}")]
    FenError(#[from] FenError),
    #[error("Move parse error: {0}")]
    SanError(#[from] SanError),
}
