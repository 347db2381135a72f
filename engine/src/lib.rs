//! Stockfish plumbing and the analysis snapshot the bot controller reads.
//!
//! The process side ([`StockfishEngine`]) speaks a small subset of UCI. Its
//! events are folded into an [`AnalysisInfo`] by [`AnalysisState`], which is
//! what callers observe through the [`EngineFacade`] trait.

pub mod analysis;
pub mod session;
pub mod stockfish;
pub mod uci;

pub use analysis::{
    AnalysisInfo, AnalysisRequest, AnalysisState, EngineFacade, EngineSettings, EngineStatus,
    Evaluation, PrincipalVariation, PvMove,
};
pub use session::AnalysisSession;
pub use stockfish::{StockfishConfig, StockfishEngine};
pub use uci::{UciError, UciMessage};

use cozy_chess::Move;
use std::time::Duration;

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    SetPosition { fen: String, moves: Vec<Move> },
    SetOption { name: String, value: Option<String> },
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
    pub infinite: bool,        // Search until "stop"
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    /// `None` when the engine reports `bestmove (none)`.
    BestMove(Option<Move>),
    Info(EngineInfo),
    Error(String),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    /// Score is a lower/upper bound from an aspiration window, not exact
    pub bound: bool,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u8>,
    pub currmove: Option<Move>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
    pub string: Option<String>,
}

/// Score from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Stockfish not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine did not respond within {0:?}")]
    Timeout(Duration),
    #[error("Engine closed before it was ready")]
    Closed,
    #[error("Engine command channel closed")]
    ChannelClosed,
    #[error("Invalid analysis position: {0}")]
    Fen(#[from] chess::FenError),
}
