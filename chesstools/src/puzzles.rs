//! `chesstools puzzle`: work through a puzzle file on the terminal.

use std::path::Path;

use anyhow::Context;
use chess::{format_square, DisplayBoard, Game, GameFacade, PlayerSide};
use puzzle::{load_puzzles, PuzzleController, PuzzleOptions, PuzzleState, Status};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Hint,
    Reset,
    Next,
    Quit,
    Move(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Empty,
        "hint" | "h" => Command::Hint,
        "reset" | "r" => Command::Reset,
        "next" | "n" => Command::Next,
        "quit" | "q" | "exit" => Command::Quit,
        text => Command::Move(text),
    }
}

pub async fn run(path: &Path, start: usize, options: PuzzleOptions) -> anyhow::Result<()> {
    let puzzles = load_puzzles(path)?;
    if start >= puzzles.len() {
        anyhow::bail!(
            "{} holds {} puzzle(s), there is no puzzle #{}",
            path.display(),
            puzzles.len(),
            start + 1
        );
    }
    tracing::info!(count = puzzles.len(), start, "Loaded puzzles");

    let mut index = start;
    let mut game = Game::new();
    let mut controller = PuzzleController::builder()
        .puzzle(puzzles[index].clone())
        .options(options)
        .on_solve(|_| println!("Solved!"))
        .on_fail(|state| {
            println!(
                "Not the move. The solution was: {}",
                state.puzzle.moves.join(" ")
            )
        })
        .build(&mut game)
        .with_context(|| format!("puzzle #{} cannot be played", index + 1))?;
    println!("Puzzle #{}", index + 1);
    println!("{}", render(&controller, &game)?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Hint => controller.toggle_hint(),
            Command::Reset => controller.reset(&mut game)?,
            Command::Next => {
                index += 1;
                let Some(next) = puzzles.get(index) else {
                    println!("No more puzzles.");
                    break;
                };
                if let Err(e) = controller.change_puzzle(next.clone(), &mut game) {
                    println!("Puzzle #{} skipped: {}", index + 1, e);
                    continue;
                }
                println!("Puzzle #{}", index + 1);
            }
            Command::Move(text) => {
                if controller.state().status.is_terminal() {
                    println!("This puzzle is over. Type 'reset' or 'next'.");
                    continue;
                }
                if let Err(e) = controller.play_move(&mut game, text) {
                    println!("{}", e);
                    continue;
                }
            }
        }
        println!("{}", render(&controller, &game)?);
    }
    Ok(())
}

fn render(controller: &PuzzleController, game: &Game) -> anyhow::Result<String> {
    let board = DisplayBoard::from_fen(&game.to_fen())?;
    let highlights: Vec<String> = controller
        .hint_target(game)
        .into_iter()
        .map(format_square)
        .collect();
    let mut out = board.render(game.orientation(), &highlights);
    out.push('\n');
    out.push_str(&status_line(controller.state(), game.turn()));
    Ok(out)
}

fn status_line(state: &PuzzleState, turn: PlayerSide) -> String {
    match state.status {
        Status::Solved => "Solved. Type 'next' for another puzzle.".to_string(),
        Status::Failed => "Failed. Type 'reset' to try again.".to_string(),
        Status::NotStarted | Status::InProgress if state.is_player_turn => format!(
            "{} to move ({}/{}). Enter a move, 'hint', 'reset', 'next' or 'quit'.",
            turn,
            state.current_move_index / 2 + 1,
            state.puzzle.moves.len().div_ceil(2)
        ),
        Status::NotStarted | Status::InProgress => "Waiting for the reply...".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::STARTING_FEN;
    use puzzle::Puzzle;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  "), Command::Empty);
        assert_eq!(parse_command("hint"), Command::Hint);
        assert_eq!(parse_command("r\n"), Command::Reset);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command(" Nf3 "), Command::Move("Nf3"));
    }

    #[test]
    fn test_render_highlights_hint() {
        let mut game = Game::new();
        let puzzle = Puzzle::new(STARTING_FEN, ["e4", "e5", "Nf3"]);
        let mut controller =
            PuzzleController::new(puzzle, PuzzleOptions::default(), &mut game).unwrap();

        let plain = render(&controller, &game).unwrap();
        assert!(!plain.contains('['));
        assert!(plain.contains("white to move (1/2)"));

        controller.toggle_hint();
        let hinted = render(&controller, &game).unwrap();
        assert!(hinted.contains("[P]"));
    }

    #[tokio::test]
    async fn test_run_rejects_missing_start() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("puzzles.json");
        std::fs::write(
            &path,
            format!(r#"[{{"fen": "{}", "moves": ["e4", "e5"]}}]"#, STARTING_FEN),
        )
        .unwrap();

        let err = run(&path, 1, PuzzleOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("no puzzle #2"));

        let missing = dir.path().join("missing.json");
        assert!(run(&missing, 0, PuzzleOptions::default()).await.is_err());
    }

    #[test]
    fn test_status_line_terminal() {
        let mut state = PuzzleState::initial(Puzzle::new(STARTING_FEN, ["e4"]));
        state.status = Status::Failed;
        assert!(status_line(&state, PlayerSide::White).starts_with("Failed"));
        state.status = Status::Solved;
        assert!(status_line(&state, PlayerSide::White).starts_with("Solved"));
    }
}
