use std::path::PathBuf;

use chess::{FenError, GameError};

#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("Puzzle controller misconfigured: {0}")]
    Configuration(&'static str),
    #[error("Invalid puzzle FEN: {0}")]
    InvalidFen(#[from] FenError),
    #[error("Scripted move {index} ({mv}) cannot be played: {source}")]
    InvalidScriptedMove {
        index: usize,
        mv: String,
        #[source]
        source: GameError,
    },
    #[error("Game error: {0}")]
    Game(#[from] GameError),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse puzzle JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
