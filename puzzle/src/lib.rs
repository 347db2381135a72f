//! Scripted chess puzzles: data model, a pure state machine and the
//! controller that runs it against a game.

pub mod controller;
pub mod error;
pub mod hint;
pub mod machine;
pub mod model;

pub use controller::{PuzzleController, PuzzleControllerBuilder};
pub use error::PuzzleError;
pub use hint::hint_squares;
pub use machine::{PlayedMove, PuzzleEffect, PuzzleEvent, PuzzleMachine, PuzzleOptions, Transition};
pub use model::{load_puzzles, parse_puzzles, HintLevel, Puzzle, PuzzleState, Status};
