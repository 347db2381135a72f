//! Pure puzzle state machine.
//!
//! [`PuzzleMachine::transition`] never touches a game. Anything that has to
//! happen outside the state (repositioning the board, playing the scripted
//! reply, reporting the outcome) comes back as [`PuzzleEffect`]s for the caller
//! to execute in order.

use chess::{HistoryEntry, PlayerSide};

use crate::model::{HintLevel, Puzzle, PuzzleState, Status};

/// A move the player made, as seen in the game history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    /// Long algebraic, castles as e1g1.
    pub uci: String,
    pub is_checkmate: bool,
}

impl PlayedMove {
    pub fn new(san: impl Into<String>, uci: impl Into<String>) -> Self {
        Self {
            san: san.into(),
            uci: uci.into(),
            is_checkmate: false,
        }
    }

    pub fn mating(mut self) -> Self {
        self.is_checkmate = true;
        self
    }
}

impl From<&HistoryEntry> for PlayedMove {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            san: entry.san.clone(),
            uci: entry.uci.clone(),
            is_checkmate: entry.is_checkmate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleEvent {
    Initialize(Puzzle),
    Reset,
    ToggleHint,
    CpuMove,
    PlayerMove(Option<PlayedMove>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleEffect {
    SetPosition {
        fen: String,
        orientation: PlayerSide,
    },
    /// Play this scripted move on the game.
    ApplyMove(String),
    Solved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: PuzzleState,
    pub effects: Vec<PuzzleEffect>,
}

impl Transition {
    fn unchanged(state: PuzzleState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleOptions {
    /// Any mating move solves the puzzle, scripted or not.
    pub solve_on_checkmate: bool,
}

impl Default for PuzzleOptions {
    fn default() -> Self {
        Self {
            solve_on_checkmate: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PuzzleMachine {
    options: PuzzleOptions,
}

impl PuzzleMachine {
    pub fn new(options: PuzzleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> PuzzleOptions {
        self.options
    }

    /// Fresh state for `puzzle` plus the effect that repositions the game.
    pub fn initialize(&self, puzzle: Puzzle) -> Transition {
        // An unreadable side to move is caught when the effect is executed
        let orientation = puzzle.player_side().unwrap_or(PlayerSide::White);
        let effect = PuzzleEffect::SetPosition {
            fen: puzzle.fen.clone(),
            orientation,
        };
        Transition {
            state: PuzzleState::initial(puzzle),
            effects: vec![effect],
        }
    }

    pub fn transition(&self, state: PuzzleState, event: PuzzleEvent) -> Transition {
        match event {
            PuzzleEvent::Initialize(puzzle) => self.initialize(puzzle),
            PuzzleEvent::Reset => self.initialize(state.puzzle),
            PuzzleEvent::ToggleHint => {
                let hint = state.hint.escalate();
                Transition::unchanged(PuzzleState { hint, ..state })
            }
            PuzzleEvent::CpuMove => self.cpu_move(state),
            PuzzleEvent::PlayerMove(played) => self.player_move(state, played),
        }
    }

    fn cpu_move(&self, state: PuzzleState) -> Transition {
        if state.is_player_turn || state.status.is_terminal() {
            return Transition::unchanged(state);
        }
        let Some(mv) = state.puzzle.moves.get(state.current_move_index).cloned() else {
            return Transition::unchanged(state);
        };

        let index = state.current_move_index + 1;
        tracing::debug!(index, mv = %mv, "Scripted reply");
        Transition {
            state: PuzzleState {
                current_move_index: index,
                next_move: state.puzzle.moves.get(index).cloned(),
                need_cpu_move: false,
                is_player_turn: true,
                status: Status::InProgress,
                ..state
            },
            effects: vec![PuzzleEffect::ApplyMove(mv)],
        }
    }

    fn player_move(&self, state: PuzzleState, played: Option<PlayedMove>) -> Transition {
        if state.status.is_terminal() {
            return Transition::unchanged(state);
        }

        let mates = self.options.solve_on_checkmate
            && played.as_ref().is_some_and(|mv| mv.is_checkmate);
        if mates {
            tracing::debug!("Mating move accepted");
            return solved(state);
        }

        let matched = match (&played, &state.next_move) {
            (Some(mv), Some(expected)) => matches_expected(mv, expected),
            _ => false,
        };
        if !matched {
            tracing::debug!(played = ?played.as_ref().map(|m| &m.san), expected = ?state.next_move, "Wrong move");
            return Transition {
                state: PuzzleState {
                    status: Status::Failed,
                    next_move: None,
                    hint: HintLevel::None,
                    need_cpu_move: false,
                    is_player_turn: false,
                    ..state
                },
                effects: vec![PuzzleEffect::Failed],
            };
        }

        if state.current_move_index + 1 >= state.puzzle.moves.len() {
            return solved(state);
        }

        let index = state.current_move_index + 1;
        Transition {
            state: PuzzleState {
                current_move_index: index,
                next_move: state.puzzle.moves.get(index).cloned(),
                status: Status::InProgress,
                hint: HintLevel::None,
                need_cpu_move: true,
                is_player_turn: false,
                ..state
            },
            effects: Vec::new(),
        }
    }
}

fn solved(state: PuzzleState) -> Transition {
    Transition {
        state: PuzzleState {
            status: Status::Solved,
            next_move: None,
            hint: HintLevel::None,
            need_cpu_move: false,
            is_player_turn: false,
            ..state
        },
        effects: vec![PuzzleEffect::Solved],
    }
}

/// Compare against the scripted move as SAN or long algebraic. Check and mate
/// marks are optional on either side.
fn matches_expected(played: &PlayedMove, expected: &str) -> bool {
    let expected = strip_marks(expected);
    strip_marks(&played.san) == expected || played.uci == expected
}

fn strip_marks(mv: &str) -> &str {
    mv.trim().trim_end_matches(['+', '#'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::STARTING_FEN;
    use proptest::prelude::*;

    fn scenario() -> Puzzle {
        Puzzle::new(STARTING_FEN, ["e4", "e5", "Nf3"])
    }

    fn run(machine: &PuzzleMachine, state: PuzzleState, events: Vec<PuzzleEvent>) -> PuzzleState {
        events
            .into_iter()
            .fold(state, |state, event| machine.transition(state, event).state)
    }

    fn player(san: &str, uci: &str) -> PuzzleEvent {
        PuzzleEvent::PlayerMove(Some(PlayedMove::new(san, uci)))
    }

    #[test]
    fn test_initialize_sets_position() {
        let machine = PuzzleMachine::default();
        let t = machine.initialize(scenario());
        assert_eq!(
            t.effects,
            vec![PuzzleEffect::SetPosition {
                fen: STARTING_FEN.to_string(),
                orientation: PlayerSide::White,
            }]
        );

        let t = machine.initialize(scenario().with_first_move(true));
        assert!(matches!(
            t.effects[0],
            PuzzleEffect::SetPosition {
                orientation: PlayerSide::Black,
                ..
            }
        ));
    }

    #[test]
    fn test_correct_then_wrong_move_fails() {
        let machine = PuzzleMachine::default();
        let state = machine.initialize(scenario()).state;

        let t = machine.transition(state, player("e4", "e2e4"));
        assert!(t.effects.is_empty());
        assert_eq!(t.state.status, Status::InProgress);
        assert_eq!(t.state.next_move.as_deref(), Some("e5"));
        assert_eq!(t.state.current_move_index, 1);
        assert!(t.state.need_cpu_move);

        let t = machine.transition(t.state, PuzzleEvent::CpuMove);
        assert_eq!(t.effects, vec![PuzzleEffect::ApplyMove("e5".into())]);
        assert!(t.state.is_player_turn);

        let t = machine.transition(t.state, player("d4", "d2d4"));
        assert_eq!(t.state.status, Status::Failed);
        assert_eq!(t.state.next_move, None);
        assert_eq!(t.effects, vec![PuzzleEffect::Failed]);
    }

    #[test]
    fn test_full_line_solves() {
        let machine = PuzzleMachine::default();
        let state = run(
            &machine,
            machine.initialize(scenario()).state,
            vec![player("e4", "e2e4"), PuzzleEvent::CpuMove],
        );
        let t = machine.transition(state, player("Nf3", "g1f3"));
        assert_eq!(t.state.status, Status::Solved);
        assert_eq!(t.effects, vec![PuzzleEffect::Solved]);
        assert!(!t.state.is_player_turn);
    }

    #[test]
    fn test_long_algebraic_matches() {
        let machine = PuzzleMachine::default();
        let state = machine
            .initialize(Puzzle::new(STARTING_FEN, ["e2e4", "e7e5"]))
            .state;
        let state = machine.transition(state, player("e4", "e2e4")).state;
        assert_eq!(state.status, Status::InProgress);
    }

    #[test]
    fn test_check_marks_optional() {
        let machine = PuzzleMachine::default();
        let state = machine
            .initialize(Puzzle::new("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", ["Ra8"]))
            .state;
        let state = machine.transition(state, player("Ra8+", "a1a8")).state;
        assert_eq!(state.status, Status::Solved);
    }

    #[test]
    fn test_missing_move_fails() {
        let machine = PuzzleMachine::default();
        let state = machine.initialize(scenario()).state;
        let t = machine.transition(state, PuzzleEvent::PlayerMove(None));
        assert_eq!(t.state.status, Status::Failed);
    }

    #[test]
    fn test_mate_solves_before_strict_match() {
        let fen = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
        let puzzle = Puzzle::new(fen, ["Rb1", "Kf8", "Rb8#"]);
        let mate = PuzzleEvent::PlayerMove(Some(PlayedMove::new("Ra8#", "a1a8").mating()));

        let machine = PuzzleMachine::default();
        let t = machine.transition(machine.initialize(puzzle.clone()).state, mate.clone());
        assert_eq!(t.state.status, Status::Solved);
        assert_eq!(t.effects, vec![PuzzleEffect::Solved]);

        let strict = PuzzleMachine::new(PuzzleOptions {
            solve_on_checkmate: false,
        });
        let t = strict.transition(strict.initialize(puzzle).state, mate);
        assert_eq!(t.state.status, Status::Failed);
    }

    #[test]
    fn test_cpu_move_guarded() {
        let machine = PuzzleMachine::default();
        let state = machine.initialize(scenario()).state;
        // Player's turn: nothing to play
        let t = machine.transition(state.clone(), PuzzleEvent::CpuMove);
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());

        // A second trigger for the same ply applies nothing
        let state = machine.transition(state, player("e4", "e2e4")).state;
        let first = machine.transition(state, PuzzleEvent::CpuMove);
        let second = machine.transition(first.state.clone(), PuzzleEvent::CpuMove);
        assert_eq!(first.effects.len(), 1);
        assert!(second.effects.is_empty());
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn test_first_move_by_opponent() {
        let machine = PuzzleMachine::default();
        let state = machine
            .initialize(scenario().with_first_move(true))
            .state;
        let t = machine.transition(state, PuzzleEvent::CpuMove);
        assert_eq!(t.effects, vec![PuzzleEffect::ApplyMove("e4".into())]);
        assert_eq!(t.state.next_move.as_deref(), Some("e5"));
        assert!(t.state.is_player_turn);
    }

    #[test]
    fn test_empty_puzzle_is_inert() {
        let machine = PuzzleMachine::default();
        let state = machine
            .initialize(Puzzle::new(STARTING_FEN, Vec::<String>::new()).with_first_move(true))
            .state;
        let t = machine.transition(state.clone(), PuzzleEvent::CpuMove);
        assert_eq!(t.state, state);
    }

    #[test]
    fn test_reset_restarts_same_puzzle() {
        let machine = PuzzleMachine::default();
        let state = run(
            &machine,
            machine.initialize(scenario()).state,
            vec![player("d4", "d2d4")],
        );
        assert_eq!(state.status, Status::Failed);
        let t = machine.transition(state, PuzzleEvent::Reset);
        assert_eq!(t.state, PuzzleState::initial(scenario()));
        assert_eq!(t.effects.len(), 1);
    }

    #[test]
    fn test_player_move_clears_hint() {
        let machine = PuzzleMachine::default();
        let state = run(
            &machine,
            machine.initialize(scenario()).state,
            vec![PuzzleEvent::ToggleHint, PuzzleEvent::ToggleHint],
        );
        assert_eq!(state.hint, HintLevel::Move);
        let state = machine.transition(state, player("e4", "e2e4")).state;
        assert_eq!(state.hint, HintLevel::None);
    }

    fn any_event() -> impl Strategy<Value = PuzzleEvent> {
        prop_oneof![
            Just(PuzzleEvent::CpuMove),
            Just(PuzzleEvent::ToggleHint),
            Just(PuzzleEvent::PlayerMove(None)),
            Just(player("e4", "e2e4")),
            Just(player("Nf3", "g1f3")),
            Just(player("d4", "d2d4")),
        ]
    }

    proptest! {
        #[test]
        fn prop_hint_never_regresses(toggles in 1usize..10) {
            let machine = PuzzleMachine::default();
            let mut state = machine.initialize(scenario()).state;
            let mut previous = state.hint;
            for i in 0..toggles {
                state = machine.transition(state, PuzzleEvent::ToggleHint).state;
                prop_assert!(state.hint >= previous);
                let expected = if i == 0 { HintLevel::Piece } else { HintLevel::Move };
                prop_assert_eq!(state.hint, expected);
                previous = state.hint;
            }
        }

        #[test]
        fn prop_terminal_states_absorb_moves(events in proptest::collection::vec(any_event(), 0..12)) {
            let machine = PuzzleMachine::default();
            let mut state = machine.initialize(scenario()).state;
            let mut outcomes = 0;
            for event in events {
                let was_terminal = state.status.is_terminal();
                let is_move = matches!(event, PuzzleEvent::CpuMove | PuzzleEvent::PlayerMove(_));
                let t = machine.transition(state.clone(), event);
                if was_terminal && is_move {
                    prop_assert_eq!(&t.state, &state);
                    prop_assert!(t.effects.is_empty());
                }
                outcomes += t
                    .effects
                    .iter()
                    .filter(|e| matches!(e, PuzzleEffect::Solved | PuzzleEffect::Failed))
                    .count();
                state = t.state;
            }
            prop_assert!(outcomes <= 1);
        }
    }
}
