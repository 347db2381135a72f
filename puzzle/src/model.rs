use std::path::Path;

use chess::{fen, FenError, PlayerSide};
use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;

/// A scripted puzzle as authored: a start position and the move sequence
/// that solves it. Moves alternate between the player and the scripted
/// opponent, starting with the player unless `make_first_move` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub fen: String,
    /// SAN or UCI.
    pub moves: Vec<String>,
    #[serde(default)]
    pub make_first_move: bool,
}

impl Puzzle {
    pub fn new<S: Into<String>>(fen: impl Into<String>, moves: impl IntoIterator<Item = S>) -> Self {
        Self {
            fen: fen.into(),
            moves: moves.into_iter().map(Into::into).collect(),
            make_first_move: false,
        }
    }

    pub fn with_first_move(mut self, make_first_move: bool) -> Self {
        self.make_first_move = make_first_move;
        self
    }

    /// The side the solver plays.
    pub fn player_side(&self) -> Result<PlayerSide, FenError> {
        let to_move = fen::side_to_move(&self.fen)?;
        Ok(if self.make_first_move {
            to_move.opposite()
        } else {
            to_move
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    NotStarted,
    InProgress,
    Solved,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Solved | Status::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintLevel {
    None,
    Piece,
    Move,
}

impl HintLevel {
    /// Next level up. `Move` is the ceiling.
    pub fn escalate(self) -> Self {
        match self {
            HintLevel::None => HintLevel::Piece,
            HintLevel::Piece | HintLevel::Move => HintLevel::Move,
        }
    }
}

/// Progress through one run of a puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleState {
    pub puzzle: Puzzle,
    pub current_move_index: usize,
    pub status: Status,
    pub next_move: Option<String>,
    pub hint: HintLevel,
    pub need_cpu_move: bool,
    pub is_player_turn: bool,
    pub on_solve_invoked: bool,
    pub on_fail_invoked: bool,
}

impl PuzzleState {
    pub fn initial(puzzle: Puzzle) -> Self {
        let make_first_move = puzzle.make_first_move;
        Self {
            next_move: puzzle.moves.first().cloned(),
            puzzle,
            current_move_index: 0,
            status: Status::NotStarted,
            hint: HintLevel::None,
            need_cpu_move: make_first_move,
            is_player_turn: !make_first_move,
            on_solve_invoked: false,
            on_fail_invoked: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PuzzleFile {
    Many(Vec<Puzzle>),
    One(Puzzle),
}

/// Parse puzzle JSON holding either a single puzzle or an array of them.
pub fn parse_puzzles(json: &str) -> Result<Vec<Puzzle>, PuzzleError> {
    let puzzles = match serde_json::from_str(json)? {
        PuzzleFile::Many(puzzles) => puzzles,
        PuzzleFile::One(puzzle) => vec![puzzle],
    };
    for puzzle in &puzzles {
        fen::parse_fen(&puzzle.fen)?;
    }
    Ok(puzzles)
}

pub fn load_puzzles(path: impl AsRef<Path>) -> Result<Vec<Puzzle>, PuzzleError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| PuzzleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let puzzles = parse_puzzles(&json)?;
    tracing::info!("Loaded {} puzzle(s) from {}", puzzles.len(), path.display());
    Ok(puzzles)
}
