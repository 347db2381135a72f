//! The game interface the puzzle and bot controllers consume.
//!
//! Controllers never own the game. They borrow it for the duration of a single
//! call, which keeps the game a single-writer resource without any locking.

use cozy_chess::Board;

use crate::game::{Game, GameError, HistoryEntry};
use crate::types::PlayerSide;

pub trait GameFacade {
    /// FEN of the current position.
    fn current_fen(&self) -> String;

    /// Side to move.
    fn turn(&self) -> PlayerSide;

    fn is_game_over(&self) -> bool;

    /// Moves played since the last `set_position`.
    fn history(&self) -> &[HistoryEntry];

    fn position(&self) -> &Board;

    fn orientation(&self) -> PlayerSide;

    /// Play a move given as SAN or UCI.
    fn make_move_san(&mut self, mv: &str) -> Result<HistoryEntry, GameError>;

    /// Load a new position, clearing history.
    fn set_position(&mut self, fen: &str, orientation: PlayerSide) -> Result<(), GameError>;
}

impl GameFacade for Game {
    fn current_fen(&self) -> String {
        self.to_fen()
    }

    fn turn(&self) -> PlayerSide {
        self.side_to_move().into()
    }

    fn is_game_over(&self) -> bool {
        Game::is_game_over(self)
    }

    fn history(&self) -> &[HistoryEntry] {
        Game::history(self)
    }

    fn position(&self) -> &Board {
        Game::position(self)
    }

    fn orientation(&self) -> PlayerSide {
        Game::orientation(self)
    }

    fn make_move_san(&mut self, mv: &str) -> Result<HistoryEntry, GameError> {
        self.make_move_str(mv)
    }

    fn set_position(&mut self, fen: &str, orientation: PlayerSide) -> Result<(), GameError> {
        self.load(fen, orientation)
    }
}
