//! Glue between a [`GameFacade`] and the [`PuzzleMachine`].

use chess::{fen, GameFacade, HistoryEntry};
use cozy_chess::Square;

use crate::error::PuzzleError;
use crate::hint::hint_squares;
use crate::machine::{PlayedMove, PuzzleEffect, PuzzleEvent, PuzzleMachine, PuzzleOptions};
use crate::model::{Puzzle, PuzzleState};

type StateCallback = Box<dyn FnMut(&PuzzleState) + Send>;
type MoveCallback = Box<dyn FnMut(&HistoryEntry) + Send>;

/// Runs one puzzle against a game.
///
/// The controller watches the game's history length. When it grows on the
/// player's turn the newest entry is fed to the machine as the player's move,
/// followed by a scripted reply if one is due.
pub struct PuzzleController {
    machine: PuzzleMachine,
    state: PuzzleState,
    observed_len: usize,
    on_solve: Option<StateCallback>,
    on_fail: Option<StateCallback>,
    on_move: Option<MoveCallback>,
}

impl PuzzleController {
    pub fn new(
        puzzle: Puzzle,
        options: PuzzleOptions,
        game: &mut impl GameFacade,
    ) -> Result<Self, PuzzleError> {
        Self::builder().puzzle(puzzle).options(options).build(game)
    }

    pub fn builder() -> PuzzleControllerBuilder {
        PuzzleControllerBuilder::default()
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    /// Pick up a move played on the game since the last call.
    pub fn observe(&mut self, game: &mut impl GameFacade) -> Result<(), PuzzleError> {
        let len = game.history().len();
        if len <= self.observed_len {
            // Nothing new, or the game was rewound underneath us
            self.observed_len = len;
            return Ok(());
        }
        self.observed_len = len;

        let player_ply = if self.state.puzzle.make_first_move {
            len % 2 == 0
        } else {
            len % 2 == 1
        };
        if !player_ply || !self.state.is_player_turn {
            return Ok(());
        }

        let Some(entry) = game.history().last().cloned() else {
            return Ok(());
        };
        if let Some(on_move) = self.on_move.as_mut() {
            on_move(&entry);
        }
        self.dispatch(PuzzleEvent::PlayerMove(Some(PlayedMove::from(&entry))), game)?;
        self.dispatch(PuzzleEvent::CpuMove, game)
    }

    /// Play `text` (SAN or UCI) for the player and process it.
    pub fn play_move(
        &mut self,
        game: &mut impl GameFacade,
        text: &str,
    ) -> Result<HistoryEntry, PuzzleError> {
        let entry = game.make_move_san(text)?;
        self.observe(game)?;
        Ok(entry)
    }

    pub fn toggle_hint(&mut self) {
        let state = self.state.clone();
        let transition = self.machine.transition(state, PuzzleEvent::ToggleHint);
        self.state = transition.state;
    }

    /// Start the current puzzle over.
    pub fn reset(&mut self, game: &mut impl GameFacade) -> Result<(), PuzzleError> {
        self.dispatch(PuzzleEvent::Reset, game)?;
        self.dispatch(PuzzleEvent::CpuMove, game)
    }

    pub fn change_puzzle(
        &mut self,
        puzzle: Puzzle,
        game: &mut impl GameFacade,
    ) -> Result<(), PuzzleError> {
        validate(&puzzle)?;
        self.dispatch(PuzzleEvent::Initialize(puzzle), game)?;
        self.dispatch(PuzzleEvent::CpuMove, game)
    }

    /// Squares the current hint points at.
    pub fn hint_target(&self, game: &impl GameFacade) -> Vec<Square> {
        match (&self.state.next_move, self.state.is_player_turn) {
            (Some(next), true) => hint_squares(game.position(), next, self.state.hint),
            _ => Vec::new(),
        }
    }

    /// Run the transition's effects, then commit its state. A failed effect
    /// leaves the previous state in place.
    fn dispatch(
        &mut self,
        event: PuzzleEvent,
        game: &mut impl GameFacade,
    ) -> Result<(), PuzzleError> {
        let transition = self.machine.transition(self.state.clone(), event);
        let mut next = transition.state;
        for effect in transition.effects {
            self.execute(effect, &mut next, game)?;
        }
        self.state = next;
        Ok(())
    }

    fn execute(
        &mut self,
        effect: PuzzleEffect,
        next: &mut PuzzleState,
        game: &mut impl GameFacade,
    ) -> Result<(), PuzzleError> {
        match effect {
            PuzzleEffect::SetPosition { fen, orientation } => {
                tracing::debug!(%fen, ?orientation, "Positioning puzzle");
                game.set_position(&fen, orientation)?;
                self.observed_len = game.history().len();
            }
            PuzzleEffect::ApplyMove(mv) => {
                let entry = game.make_move_san(&mv).map_err(|source| {
                    tracing::error!("Scripted move {} rejected: {}", mv, source);
                    PuzzleError::InvalidScriptedMove {
                        index: next.current_move_index.saturating_sub(1),
                        mv: mv.clone(),
                        source,
                    }
                })?;
                self.observed_len = game.history().len();
                if let Some(on_move) = self.on_move.as_mut() {
                    on_move(&entry);
                }
            }
            PuzzleEffect::Solved => {
                if !next.on_solve_invoked {
                    next.on_solve_invoked = true;
                    tracing::info!("Puzzle solved");
                    if let Some(on_solve) = self.on_solve.as_mut() {
                        on_solve(&*next);
                    }
                }
            }
            PuzzleEffect::Failed => {
                if !next.on_fail_invoked {
                    next.on_fail_invoked = true;
                    tracing::info!("Puzzle failed");
                    if let Some(on_fail) = self.on_fail.as_mut() {
                        on_fail(&*next);
                    }
                }
            }
        }
        Ok(())
    }
}

/// The whole FEN must load and name a side to move.
fn validate(puzzle: &Puzzle) -> Result<(), PuzzleError> {
    fen::parse_fen(&puzzle.fen)?;
    puzzle.player_side()?;
    Ok(())
}

#[derive(Default)]
pub struct PuzzleControllerBuilder {
    puzzle: Option<Puzzle>,
    options: PuzzleOptions,
    on_solve: Option<StateCallback>,
    on_fail: Option<StateCallback>,
    on_move: Option<MoveCallback>,
}

impl PuzzleControllerBuilder {
    pub fn puzzle(mut self, puzzle: Puzzle) -> Self {
        self.puzzle = Some(puzzle);
        self
    }

    pub fn options(mut self, options: PuzzleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn on_solve(mut self, f: impl FnMut(&PuzzleState) + Send + 'static) -> Self {
        self.on_solve = Some(Box::new(f));
        self
    }

    pub fn on_fail(mut self, f: impl FnMut(&PuzzleState) + Send + 'static) -> Self {
        self.on_fail = Some(Box::new(f));
        self
    }

    pub fn on_move(mut self, f: impl FnMut(&HistoryEntry) + Send + 'static) -> Self {
        self.on_move = Some(Box::new(f));
        self
    }

    /// Position `game` for the puzzle and play the opening scripted move if due.
    pub fn build(self, game: &mut impl GameFacade) -> Result<PuzzleController, PuzzleError> {
        let puzzle = self
            .puzzle
            .ok_or(PuzzleError::Configuration("a puzzle is required"))?;
        validate(&puzzle)?;

        let machine = PuzzleMachine::new(self.options);
        let mut controller = PuzzleController {
            machine,
            state: PuzzleState::initial(puzzle.clone()),
            observed_len: 0,
            on_solve: self.on_solve,
            on_fail: self.on_fail,
            on_move: self.on_move,
        };
        controller.dispatch(PuzzleEvent::Initialize(puzzle), game)?;
        controller.dispatch(PuzzleEvent::CpuMove, game)?;
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HintLevel, Status};
    use chess::{Game, STARTING_FEN};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn scenario() -> Puzzle {
        Puzzle::new(STARTING_FEN, ["e4", "e5", "Nf3"])
    }

    #[test]
    fn test_wrong_second_move_fails() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(scenario(), PuzzleOptions::default(), &mut game).unwrap();

        controller.play_move(&mut game, "e4").unwrap();
        // Scripted e5 was played straight away
        assert_eq!(game.history().len(), 2);
        assert_eq!(game.history()[1].san, "e5");
        assert_eq!(controller.state().status, Status::InProgress);
        assert_eq!(controller.state().next_move.as_deref(), Some("Nf3"));
        assert_eq!(controller.state().current_move_index, 2);

        controller.play_move(&mut game, "d4").unwrap();
        assert_eq!(controller.state().status, Status::Failed);
        assert_eq!(game.history().len(), 3);
    }

    #[test]
    fn test_callbacks_fire_once() {
        let solved = Arc::new(AtomicUsize::new(0));
        let moves = Arc::new(AtomicUsize::new(0));
        let mut game = Game::new();
        let mut controller = PuzzleController::builder()
            .puzzle(scenario())
            .on_solve({
                let solved = solved.clone();
                move |_| {
                    solved.fetch_add(1, Ordering::SeqCst);
                }
            })
            .on_move({
                let moves = moves.clone();
                move |_| {
                    moves.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build(&mut game)
            .unwrap();

        controller.play_move(&mut game, "e4").unwrap();
        controller.play_move(&mut game, "g1f3").unwrap();
        assert_eq!(controller.state().status, Status::Solved);
        assert!(controller.state().on_solve_invoked);

        // Further play on the board does not re-trigger anything
        controller.play_move(&mut game, "Nc6").unwrap();
        controller.play_move(&mut game, "Bc4").unwrap();
        assert_eq!(solved.load(Ordering::SeqCst), 1);
        assert_eq!(moves.load(Ordering::SeqCst), 3);
        assert_eq!(controller.state().status, Status::Solved);
    }

    #[test]
    fn test_first_move_played_on_build() {
        let mut game = Game::new();
        let controller = PuzzleController::new(
            scenario().with_first_move(true),
            PuzzleOptions::default(),
            &mut game,
        )
        .unwrap();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.history()[0].san, "e4");
        assert!(controller.state().is_player_turn);
        assert_eq!(controller.state().next_move.as_deref(), Some("e5"));
        assert_eq!(game.orientation(), chess::PlayerSide::Black);
    }

    #[test]
    fn test_observe_is_idempotent() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(scenario(), PuzzleOptions::default(), &mut game).unwrap();
        game.make_move_str("e4").unwrap();
        controller.observe(&mut game).unwrap();
        controller.observe(&mut game).unwrap();
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_reset_and_change_puzzle() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(scenario(), PuzzleOptions::default(), &mut game).unwrap();
        controller.play_move(&mut game, "d4").unwrap();
        assert_eq!(controller.state().status, Status::Failed);

        controller.reset(&mut game).unwrap();
        assert_eq!(controller.state().status, Status::NotStarted);
        assert!(game.history().is_empty());
        controller.play_move(&mut game, "e4").unwrap();
        assert_eq!(controller.state().status, Status::InProgress);

        let next = Puzzle::new("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", ["Ra8+"]);
        controller.change_puzzle(next, &mut game).unwrap();
        assert_eq!(controller.state().next_move.as_deref(), Some("Ra8+"));
        assert!(game.history().is_empty());
        controller.play_move(&mut game, "Ra8").unwrap();
        assert_eq!(controller.state().status, Status::Solved);
    }

    #[test]
    fn test_hint_target() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(scenario(), PuzzleOptions::default(), &mut game).unwrap();
        assert!(controller.hint_target(&game).is_empty());
        controller.toggle_hint();
        assert_eq!(controller.state().hint, HintLevel::Piece);
        assert_eq!(controller.hint_target(&game), vec![Square::E2]);
        controller.toggle_hint();
        assert_eq!(controller.hint_target(&game), vec![Square::E2, Square::E4]);
    }

    #[test]
    fn test_missing_puzzle_is_configuration_error() {
        let mut game = Game::new();
        let result = PuzzleController::builder().build(&mut game);
        assert!(matches!(result, Err(PuzzleError::Configuration(_))));
    }

    #[test]
    fn test_bad_scripted_reply_surfaces() {
        let mut game = Game::new();
        let puzzle = Puzzle::new(STARTING_FEN, ["e4", "Ke2", "Nf3"]);
        let mut controller =
            PuzzleController::new(puzzle, PuzzleOptions::default(), &mut game).unwrap();
        let err = controller.play_move(&mut game, "e4").unwrap_err();
        assert!(matches!(
            err,
            PuzzleError::InvalidScriptedMove { index: 1, .. }
        ));

        // The reply never reached the board, so the state still waits for it
        let state = controller.state();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.turn(), chess::PlayerSide::Black);
        assert!(!state.is_player_turn);
        assert!(state.need_cpu_move);
        assert_eq!(state.current_move_index, 1);
        assert_eq!(state.next_move.as_deref(), Some("Ke2"));
        assert_eq!(state.status, Status::InProgress);
    }

    #[test]
    fn test_unloadable_puzzle_keeps_current_one() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(scenario(), PuzzleOptions::default(), &mut game).unwrap();
        controller.play_move(&mut game, "e4").unwrap();
        let before = controller.state().clone();
        let fen_before = game.to_fen();

        let garbage = Puzzle::new("garbage w - - 0 1", ["e4"]);
        assert!(matches!(
            controller.change_puzzle(garbage, &mut game),
            Err(PuzzleError::InvalidFen(_))
        ));
        assert_eq!(controller.state(), &before);
        assert_eq!(game.to_fen(), fen_before);
        assert_eq!(game.history().len(), 2);

        let result = PuzzleController::new(
            Puzzle::new("garbage w - - 0 1", ["e4"]),
            PuzzleOptions::default(),
            &mut Game::new(),
        );
        assert!(matches!(result, Err(PuzzleError::InvalidFen(_))));
    }

    fn first_move_scenario() -> Puzzle {
        Puzzle::new(STARTING_FEN, ["e4", "e5", "Nf3", "Nc6"]).with_first_move(true)
    }

    #[test]
    fn test_first_move_line_solves() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(first_move_scenario(), PuzzleOptions::default(), &mut game)
                .unwrap();

        controller.play_move(&mut game, "e5").unwrap();
        assert_eq!(controller.state().status, Status::InProgress);
        assert_eq!(controller.state().current_move_index, 3);
        assert_eq!(game.history().len(), 3);
        assert_eq!(game.history()[2].san, "Nf3");

        controller.play_move(&mut game, "Nc6").unwrap();
        assert_eq!(controller.state().status, Status::Solved);
        assert_eq!(game.history().len(), 4);
    }

    #[test]
    fn test_first_move_wrong_reply_fails() {
        let mut game = Game::new();
        let mut controller =
            PuzzleController::new(first_move_scenario(), PuzzleOptions::default(), &mut game)
                .unwrap();

        controller.play_move(&mut game, "d5").unwrap();
        assert_eq!(controller.state().status, Status::Failed);
        // No scripted reply after a failure
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_fail_callback_fires_once() {
        let failed = Arc::new(AtomicUsize::new(0));
        let mut game = Game::new();
        let mut controller = PuzzleController::builder()
            .puzzle(scenario())
            .on_fail({
                let failed = failed.clone();
                move |_| {
                    failed.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build(&mut game)
            .unwrap();

        controller.play_move(&mut game, "d4").unwrap();
        assert_eq!(controller.state().status, Status::Failed);
        assert!(controller.state().on_fail_invoked);

        controller.play_move(&mut game, "d5").unwrap();
        controller.play_move(&mut game, "c4").unwrap();
        controller.observe(&mut game).unwrap();
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().status, Status::Failed);

        // A reset starts a fresh run, which may fail again
        controller.reset(&mut game).unwrap();
        assert!(!controller.state().on_fail_invoked);
        controller.play_move(&mut game, "a3").unwrap();
        assert_eq!(failed.load(Ordering::SeqCst), 2);
    }
}
