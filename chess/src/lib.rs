pub mod board_display;
pub mod converters;
pub mod facade;
pub mod fen;
pub mod game;
pub mod san;
pub mod types;
pub mod uci;

pub use board_display::{DisplayBoard, DisplayBoardError};
pub use converters::*;
pub use facade::GameFacade;
pub use fen::{fen_key, same_position, FenError, STARTING_FEN};
pub use game::{EndReason, Game, GameError, GameResult, HistoryEntry};
pub use san::{format_san, parse_move, parse_san, SanError};
pub use types::{PieceKind, PlayerSide};
pub use uci::{
    convert_uci_castling_to_cozy, format_uci_move, format_uci_standard, parse_legal_uci,
    parse_uci_move, UciMoveError,
};
