//! Analysis snapshot built from streaming engine output.

use chess::{convert_uci_castling_to_cozy, format_san, format_uci_standard, fen, PlayerSide};
use cozy_chess::Board;
use serde::{Deserialize, Serialize};

use crate::{EngineEvent, EngineInfo, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineStatus {
    #[default]
    Uninitialized,
    Ready,
    Analyzing,
    Error,
}

/// Evaluation from white's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    Cp(i32),
    Mate(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvMove {
    pub san: String,
    pub uci: String,
}

impl PvMove {
    pub fn new(san: impl Into<String>, uci: impl Into<String>) -> Self {
        Self {
            san: san.into(),
            uci: uci.into(),
        }
    }
}

/// One ranked candidate line. Rank 1 is the engine's best line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalVariation {
    pub rank: u8,
    pub evaluation: Option<Evaluation>,
    pub moves: Vec<PvMove>,
}

/// What a caller can see of the engine at any instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInfo {
    pub status: EngineStatus,
    pub is_engine_thinking: bool,
    pub has_results: bool,
    /// FEN the current results were computed for.
    pub analyzed_fen: String,
    /// Sorted by rank.
    pub principal_variations: Vec<PrincipalVariation>,
    pub depth: u32,
}

/// Read access to published analysis.
pub trait EngineFacade {
    fn info(&self) -> &AnalysisInfo;
}

impl EngineFacade for AnalysisInfo {
    fn info(&self) -> &AnalysisInfo {
        self
    }
}

/// Engine search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub depth: Option<u8>,
    pub skill_level: Option<u8>,
    /// Milliseconds.
    pub move_time: Option<u64>,
    pub multi_pv: u8,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            depth: None,
            skill_level: None,
            move_time: Some(1000),
            multi_pv: 1,
        }
    }
}

/// Request to analyze one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub fen: String,
    pub settings: EngineSettings,
}

/// Folds engine events into an [`AnalysisInfo`].
///
/// Starting a new analysis while a search is still running leaves a `bestmove`
/// (and possibly trailing `info` lines) from the old search in flight. Those
/// are counted in `stale_searches` and dropped so they are never attributed to
/// the new `analyzed_fen`.
#[derive(Debug, Default)]
pub struct AnalysisState {
    info: AnalysisInfo,
    board: Option<Board>,
    multi_pv: u8,
    stale_searches: u32,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &AnalysisInfo {
        &self.info
    }

    /// Reset results and mark the engine as thinking about `fen`.
    pub fn begin(&mut self, fen: &str, multi_pv: u8) -> Result<(), chess::FenError> {
        let board = fen::parse_fen(fen)?;
        if self.info.is_engine_thinking {
            self.stale_searches += 1;
        }
        self.board = Some(board);
        self.multi_pv = multi_pv.max(1);
        self.info.analyzed_fen = fen.to_string();
        self.info.principal_variations.clear();
        self.info.has_results = false;
        self.info.depth = 0;
        self.info.is_engine_thinking = true;
        self.info.status = EngineStatus::Analyzing;
        Ok(())
    }

    /// Apply one engine event. Returns true if the published info changed.
    pub fn apply(&mut self, event: &EngineEvent) -> bool {
        match event {
            EngineEvent::Ready => {
                if self.info.status == EngineStatus::Uninitialized {
                    self.info.status = EngineStatus::Ready;
                    return true;
                }
                false
            }
            EngineEvent::Info(info) => {
                if self.stale_searches > 0 || !self.info.is_engine_thinking {
                    tracing::trace!("Dropping info from a superseded search");
                    return false;
                }
                self.apply_info(info)
            }
            EngineEvent::BestMove(mv) => {
                if self.stale_searches > 0 {
                    self.stale_searches -= 1;
                    tracing::trace!("Dropping bestmove from a superseded search");
                    return false;
                }
                if !self.info.is_engine_thinking {
                    return false;
                }
                if self.info.principal_variations.is_empty() {
                    // Searches too shallow to print a pv still report bestmove
                    if let (Some(mv), Some(board)) = (mv, self.board.as_ref()) {
                        let moves = line_to_pv_moves(board, &[*mv]);
                        if !moves.is_empty() {
                            self.info.principal_variations.push(PrincipalVariation {
                                rank: 1,
                                evaluation: None,
                                moves,
                            });
                        }
                    }
                }
                self.info.has_results = !self.info.principal_variations.is_empty();
                self.info.is_engine_thinking = false;
                self.info.status = EngineStatus::Ready;
                true
            }
            EngineEvent::Error(err) => {
                tracing::warn!("Engine reported error: {}", err);
                self.info.status = EngineStatus::Error;
                self.info.is_engine_thinking = false;
                true
            }
        }
    }

    fn apply_info(&mut self, info: &EngineInfo) -> bool {
        let Some(board) = self.board.as_ref() else {
            return false;
        };
        if info.pv.is_empty() || info.bound {
            return false;
        }
        let rank = info.multipv.unwrap_or(1).max(1);
        if rank > self.multi_pv {
            return false;
        }

        let moves = line_to_pv_moves(board, &info.pv);
        if moves.is_empty() {
            tracing::debug!("Engine pv did not replay on {}", self.info.analyzed_fen);
            return false;
        }

        let side = PlayerSide::from(board.side_to_move());
        let pv = PrincipalVariation {
            rank,
            evaluation: info.score.map(|s| to_white_perspective(s, side)),
            moves,
        };

        let pvs = &mut self.info.principal_variations;
        match pvs.iter_mut().find(|p| p.rank == rank) {
            Some(existing) => *existing = pv,
            None => {
                pvs.push(pv);
                pvs.sort_by_key(|p| p.rank);
            }
        }
        if let Some(depth) = info.depth {
            self.info.depth = self.info.depth.max(u32::from(depth));
        }
        self.info.has_results = true;
        true
    }
}

/// Convert a side-to-move relative score to white's perspective.
pub fn to_white_perspective(score: Score, side_to_move: PlayerSide) -> Evaluation {
    let sign = match side_to_move {
        PlayerSide::White => 1,
        PlayerSide::Black => -1,
    };
    match score {
        Score::Centipawns(cp) => Evaluation::Cp(cp * sign),
        Score::Mate(m) => Evaluation::Mate(m * sign),
    }
}

/// Replay raw engine moves from `board`, producing SAN + standard UCI for each.
/// Stops at the first move that is not legal.
fn line_to_pv_moves(board: &Board, line: &[cozy_chess::Move]) -> Vec<PvMove> {
    let mut board = board.clone();
    let mut moves = Vec::with_capacity(line.len());
    for &raw in line {
        let legal = chess::uci::legal_moves(&board);
        let mv = convert_uci_castling_to_cozy(raw, &legal);
        if !legal.contains(&mv) {
            break;
        }
        moves.push(PvMove {
            san: format_san(&board, mv),
            uci: format_uci_standard(&board, mv),
        });
        board.play_unchecked(mv);
    }
    moves
}
