//! `chesstools play`: a human against the engine bot on stdin.

use anyhow::Context;
use bot::{BotConfig, BotController, BotEvent, TimerFired, TokioScheduler};
use chess::{format_square, DisplayBoard, Game, GameFacade, PlayerSide, STARTING_FEN};
use engine::{AnalysisSession, StockfishConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Instrument;

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Undo,
    Board,
    Quit,
    Move(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "undo" | "u" => Input::Undo,
        "board" | "b" => Input::Board,
        "quit" | "q" | "exit" => Input::Quit,
        text => Input::Move(text),
    }
}

pub async fn run(config: BotConfig, stockfish: StockfishConfig) -> anyhow::Result<()> {
    run_inner(config, stockfish)
        .instrument(tracing::info_span!("play", level = config.level))
        .await
}

async fn run_inner(config: BotConfig, stockfish: StockfishConfig) -> anyhow::Result<()> {
    let mut engine = AnalysisSession::spawn(stockfish)
        .await
        .context("failed to start Stockfish")?;
    let (scheduler, mut timers) = TokioScheduler::new();
    let mut bot = BotController::builder()
        .config(config)
        .scheduler(scheduler)
        .build()?;

    let human = config.play_as.opposite();
    let mut game = Game::new();
    game.load(STARTING_FEN, human)?;
    println!("You play {}. Enter moves as SAN or UCI, 'undo', 'board' or 'quit'.", human);
    println!("{}", render(&game)?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if let Some((result, reason)) = game.outcome() {
            println!("Game over: {:?} ({:?})", result, reason);
            break;
        }

        if let Some(request) = bot.engine_request(&game, &engine) {
            engine.analyze(&request).await?;
        }
        report(bot.observe(&game, &engine));

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Empty => {}
                    Input::Quit => break,
                    Input::Board => println!("{}", render(&game)?),
                    Input::Undo => {
                        bot.stop();
                        // Take back the bot's reply too when there is one
                        let plies = if game.turn() == human { 2 } else { 1 };
                        for _ in 0..plies.min(game.history().len()) {
                            game.undo()?;
                        }
                        println!("{}", render(&game)?);
                    }
                    Input::Move(text) => {
                        if game.turn() != human {
                            println!("Wait for the bot to move.");
                            continue;
                        }
                        match game.make_move_str(text) {
                            Ok(entry) => {
                                println!("You play {}", entry.san);
                                println!("{}", render(&game)?);
                            }
                            Err(e) => println!("{}", e),
                        }
                    }
                }
            }

            fired = timers.recv() => {
                let Some(TimerFired(token)) = fired else { break };
                let events = bot.on_timer_fired(token, &mut game, &engine);
                let moved = events.iter().any(|e| matches!(e, BotEvent::MoveCompleted(_)));
                report(events);
                if moved {
                    println!("{}", render(&game)?);
                }
            }

            event = engine.next_event() => {
                let event = event.context("Stockfish exited")?;
                engine.apply_event(&event);
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

fn report(events: Vec<BotEvent>) {
    for event in events {
        match event {
            BotEvent::MoveStarted(mv) => tracing::debug!(san = %mv.san, "Bot picked a move"),
            BotEvent::MoveCompleted(mv) => println!("Bot plays {}", mv.san),
            BotEvent::Error(e) => println!("Bot error: {}", e),
        }
    }
}

fn render(game: &Game) -> anyhow::Result<String> {
    let board = DisplayBoard::from_fen(&game.to_fen())?;
    let last: Vec<String> = match game.history().last() {
        Some(entry) => vec![format_square(entry.from), format_square(entry.to)],
        None => Vec::new(),
    };
    let side = match game.turn() {
        PlayerSide::White => "White",
        PlayerSide::Black => "Black",
    };
    Ok(format!(
        "{}\n{} to move",
        board.render(game.orientation(), &last),
        side
    ))
}
