use chess::{Game, GameFacade, STARTING_FEN};
use puzzle::{PuzzleController, PuzzleOptions, Puzzle, Status};

fn opening() -> Puzzle {
    Puzzle::new(STARTING_FEN, ["e4", "e5", "Nf3"])
}

#[test]
fn player_fails_on_deviation() {
    let mut game = Game::new();
    let mut controller =
        PuzzleController::new(opening(), PuzzleOptions::default(), &mut game).unwrap();

    game.make_move_san("e4").unwrap();
    controller.observe(&mut game).unwrap();
    assert_eq!(controller.state().status, Status::InProgress);
    assert_eq!(controller.state().current_move_index, 2);

    game.make_move_san("d4").unwrap();
    controller.observe(&mut game).unwrap();
    assert_eq!(controller.state().status, Status::Failed);
    assert_eq!(controller.state().next_move, None);
}

#[test]
fn player_solves_full_line() {
    let mut game = Game::new();
    let mut controller =
        PuzzleController::new(opening(), PuzzleOptions::default(), &mut game).unwrap();

    controller.play_move(&mut game, "e2e4").unwrap();
    assert_eq!(game.history().last().map(|e| e.san.as_str()), Some("e5"));
    controller.play_move(&mut game, "Nf3").unwrap();
    assert_eq!(controller.state().status, Status::Solved);
}

#[test]
fn alternative_mate_solves_puzzle() {
    // Both Qxf7# and the scripted Qh5 lines are on the board; only mate counts
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
    let puzzle = Puzzle::new(fen, ["Qb3", "Qe7", "Qxf7+"]);

    let mut game = Game::new();
    let mut controller =
        PuzzleController::new(puzzle.clone(), PuzzleOptions::default(), &mut game).unwrap();
    controller.play_move(&mut game, "Qxf7#").unwrap();
    assert_eq!(controller.state().status, Status::Solved);

    let strict = PuzzleOptions {
        solve_on_checkmate: false,
    };
    let mut controller = PuzzleController::new(puzzle, strict, &mut game).unwrap();
    controller.play_move(&mut game, "Qxf7").unwrap();
    assert_eq!(controller.state().status, Status::Failed);
}
