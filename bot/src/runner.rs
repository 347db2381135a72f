//! Playing a full bot-vs-bot game against two live engines.

use std::time::Duration;

use chess::{EndReason, Game, GameResult, PlayerSide};
use engine::{AnalysisSession, EngineError};
use tracing::Instrument;

use crate::controller::{BotConfig, BotController, BotEvent, DEFAULT_MOVE_DELAY};
use crate::error::RunnerError;
use crate::scheduler::{TimerFired, TokioScheduler};
use crate::tournament::GameOutcome;

pub const DEFAULT_MAX_PLIES: usize = 300;

#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    pub move_delay: Duration,
    /// The game is drawn once this many plies have been played.
    pub max_plies: usize,
    pub randomness: u8,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            move_delay: DEFAULT_MOVE_DELAY,
            max_plies: DEFAULT_MAX_PLIES,
            randomness: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub outcome: GameOutcome,
    /// `None` when the game hit the ply cap.
    pub reason: Option<EndReason>,
    pub moves: Vec<String>,
    pub final_fen: String,
}

impl From<GameResult> for GameOutcome {
    fn from(result: GameResult) -> Self {
        match result {
            GameResult::WhiteWins => GameOutcome::WhiteWins,
            GameResult::BlackWins => GameOutcome::BlackWins,
            GameResult::Draw => GameOutcome::Draw,
        }
    }
}

/// Play `white_level` against `black_level` from the starting position.
pub async fn run_game(
    white_level: u8,
    black_level: u8,
    engines: (&mut AnalysisSession, &mut AnalysisSession),
    settings: GameSettings,
) -> Result<GameRecord, RunnerError> {
    run_game_inner(white_level, black_level, engines, settings)
        .instrument(tracing::info_span!("game", white = white_level, black = black_level))
        .await
}

async fn run_game_inner(
    white_level: u8,
    black_level: u8,
    (white_engine, black_engine): (&mut AnalysisSession, &mut AnalysisSession),
    settings: GameSettings,
) -> Result<GameRecord, RunnerError> {
    let (scheduler, mut timers) = TokioScheduler::new();
    let config = |play_as, level| BotConfig {
        play_as,
        move_delay: settings.move_delay,
        randomness: settings.randomness,
        level,
    };
    let mut white = BotController::new(config(PlayerSide::White, white_level), scheduler.clone())?;
    let mut black = BotController::new(config(PlayerSide::Black, black_level), scheduler)?;
    let mut game = Game::new();
    tracing::info!("Game started");

    loop {
        if let Some((result, reason)) = game.outcome() {
            tracing::info!(?result, ?reason, plies = game.history().len(), "Game over");
            return Ok(record(&game, result.into(), Some(reason)));
        }
        if game.history().len() >= settings.max_plies {
            tracing::info!(plies = settings.max_plies, "Ply cap reached, adjudicating a draw");
            return Ok(record(&game, GameOutcome::Draw, None));
        }

        drive(&mut white, white_engine, &game).await?;
        drive(&mut black, black_engine, &game).await?;

        tokio::select! {
            fired = timers.recv() => {
                let TimerFired(token) = fired.ok_or(RunnerError::TimersClosed)?;
                check(white.on_timer_fired(token, &mut game, &*white_engine))?;
                check(black.on_timer_fired(token, &mut game, &*black_engine))?;
            }

            event = white_engine.next_event() => {
                let event = event.ok_or(EngineError::ChannelClosed)?;
                white_engine.apply_event(&event);
            }

            event = black_engine.next_event() => {
                let event = event.ok_or(EngineError::ChannelClosed)?;
                black_engine.apply_event(&event);
            }
        }
    }
}

/// Start analysis if the bot needs it, then let the bot look at the board.
async fn drive(
    bot: &mut BotController<TokioScheduler>,
    engine: &mut AnalysisSession,
    game: &Game,
) -> Result<(), RunnerError> {
    if let Some(request) = bot.engine_request(game, &*engine) {
        engine.analyze(&request).await?;
    }
    check(bot.observe(game, &*engine))
}

fn check(events: Vec<BotEvent>) -> Result<(), RunnerError> {
    for event in events {
        match event {
            BotEvent::MoveStarted(mv) => tracing::debug!(san = %mv.san, "Bot thinking done"),
            BotEvent::MoveCompleted(mv) => tracing::debug!(san = %mv.san, "Bot moved"),
            BotEvent::Error(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn record(game: &Game, outcome: GameOutcome, reason: Option<EndReason>) -> GameRecord {
    GameRecord {
        outcome,
        reason,
        moves: game.history().iter().map(|e| e.san.clone()).collect(),
        final_fen: game.to_fen(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::StockfishConfig;

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(GameOutcome::from(GameResult::WhiteWins), GameOutcome::WhiteWins);
        assert_eq!(GameOutcome::from(GameResult::Draw), GameOutcome::Draw);
    }

    #[tokio::test]
    #[ignore = "requires a Stockfish binary"]
    async fn test_quick_game_finishes() {
        let mut white = AnalysisSession::spawn(StockfishConfig::default()).await.unwrap();
        let mut black = AnalysisSession::spawn(StockfishConfig::default()).await.unwrap();
        let settings = GameSettings {
            move_delay: Duration::from_millis(1),
            max_plies: 20,
            randomness: 0,
        };
        let record = run_game(1, 2, (&mut white, &mut black), settings).await.unwrap();
        assert!(record.moves.len() <= 20);
        assert!(!record.moves.is_empty());
        white.shutdown().await;
        black.shutdown().await;
    }
}
