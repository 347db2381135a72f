//! Deciding when the bot moves and committing the move after a delay.
//!
//! The controller is driven by its owner: [`BotController::observe`] whenever
//! the game or the engine snapshot may have changed, and
//! [`BotController::on_timer_fired`] when a scheduled commit elapses. Neither
//! call blocks.

use std::time::Duration;

use chess::{fen, GameFacade, PlayerSide};
use engine::{AnalysisInfo, AnalysisRequest, EngineFacade, PvMove};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::BotError;
use crate::presets::{bot_preset, MAX_LEVEL, MIN_LEVEL};
use crate::scheduler::{Scheduler, TimerHandle, TimerToken};
use crate::selection::{multi_pv_count, select_move_with_rng};

pub const DEFAULT_MOVE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotConfig {
    pub play_as: PlayerSide,
    pub move_delay: Duration,
    /// 0 always plays the engine's best move.
    pub randomness: u8,
    /// Difficulty level, see [`crate::presets`].
    pub level: u8,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            play_as: PlayerSide::Black,
            move_delay: DEFAULT_MOVE_DELAY,
            randomness: 0,
            level: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotPhase {
    #[default]
    Idle,
    AwaitingEngine,
    Committing,
    Error,
}

/// What happened during one `observe` / `on_timer_fired` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    MoveStarted(PvMove),
    MoveCompleted(PvMove),
    Error(BotError),
}

type MoveCallback = Box<dyn FnMut(&PvMove) + Send>;
type ErrorCallback = Box<dyn FnMut(&BotError) + Send>;

struct PendingCommit<H> {
    handle: H,
    mv: PvMove,
    /// Live FEN when the commit was scheduled.
    fen: String,
    /// FEN the chosen move was analyzed for.
    analyzed_fen: String,
}

pub struct BotController<S: Scheduler> {
    config: BotConfig,
    scheduler: S,
    rng: StdRng,
    observed_fen: Option<String>,
    position_awaiting_move: Option<String>,
    has_moved_for_position: bool,
    /// Analysis that already produced an error for this position.
    rejected: Option<AnalysisInfo>,
    pending: Option<PendingCommit<S::Handle>>,
    phase: BotPhase,
    last_move: Option<PvMove>,
    error: Option<BotError>,
    announcement: Option<String>,
    on_move_start: Option<MoveCallback>,
    on_move_complete: Option<MoveCallback>,
    on_error: Option<ErrorCallback>,
}

impl<S: Scheduler> BotController<S> {
    pub fn new(config: BotConfig, scheduler: S) -> Result<Self, BotError> {
        BotControllerBuilder::new()
            .config(config)
            .scheduler(scheduler)
            .build()
    }

    pub fn builder() -> BotControllerBuilder<S> {
        BotControllerBuilder::new()
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn phase(&self) -> BotPhase {
        self.phase
    }

    pub fn last_move(&self) -> Option<&PvMove> {
        self.last_move.as_ref()
    }

    pub fn error(&self) -> Option<&BotError> {
        self.error.as_ref()
    }

    /// Live-region text for the last committed move.
    pub fn announcement(&self) -> Option<&str> {
        self.announcement.as_deref()
    }

    /// FEN of the position a commit is scheduled for.
    pub fn position_awaiting_move(&self) -> Option<&str> {
        self.position_awaiting_move.as_deref()
    }

    pub fn has_pending_move(&self) -> bool {
        self.pending.is_some()
    }

    /// The analysis the engine should run, if the bot is to move and the engine
    /// has neither results nor a search running for this position.
    pub fn engine_request(
        &self,
        game: &impl GameFacade,
        engine: &impl EngineFacade,
    ) -> Option<AnalysisRequest> {
        if game.is_game_over() || game.turn() != self.config.play_as {
            return None;
        }
        let fen = game.current_fen();
        let info = engine.info();
        let current = fen::same_position(&info.analyzed_fen, &fen);
        if current && (info.is_engine_thinking || info.has_results) {
            return None;
        }
        let preset = bot_preset(self.config.level)?;
        Some(AnalysisRequest {
            fen,
            settings: preset.engine_settings(multi_pv_count(self.config.randomness)),
        })
    }

    /// Re-evaluate the trigger against the current game and analysis.
    pub fn observe(&mut self, game: &impl GameFacade, engine: &impl EngineFacade) -> Vec<BotEvent> {
        let mut events = Vec::new();
        let fen = game.current_fen();

        if self.observed_fen.as_deref() != Some(fen.as_str()) {
            if self.pending.is_some() {
                tracing::debug!("Position changed while a move was pending");
            }
            self.clear_attempt();
            self.rejected = None;
            // An error only ever describes the position it happened in
            self.error = None;
            self.observed_fen = Some(fen.clone());
            self.phase = BotPhase::Idle;
        }

        if game.is_game_over() || game.turn() != self.config.play_as {
            if self.pending.is_none() {
                self.phase = BotPhase::Idle;
            }
            return events;
        }
        if self.has_moved_for_position {
            return events;
        }

        let info = engine.info();
        if info.is_engine_thinking || !info.has_results {
            self.phase = BotPhase::AwaitingEngine;
            return events;
        }
        if !fen::same_position(&info.analyzed_fen, &fen) {
            tracing::trace!(analyzed = %info.analyzed_fen, current = %fen, "Ignoring stale analysis");
            self.phase = BotPhase::AwaitingEngine;
            return events;
        }
        if self.rejected.as_ref() == Some(info) {
            return events;
        }

        self.has_moved_for_position = true;
        let side = game.turn();
        let Some(mv) = select_move_with_rng(
            &info.principal_variations,
            self.config.randomness,
            side,
            &mut self.rng,
        ) else {
            self.rejected = Some(info.clone());
            self.fail(BotError::NoMoveFound, &mut events);
            return events;
        };

        let handle = self.scheduler.schedule(self.config.move_delay);
        tracing::debug!(san = %mv.san, token = ?handle.token(), "Scheduling bot move");
        self.pending = Some(PendingCommit {
            handle,
            mv: mv.clone(),
            fen: fen.clone(),
            analyzed_fen: info.analyzed_fen.clone(),
        });
        self.position_awaiting_move = Some(fen);
        self.phase = BotPhase::Committing;
        if let Some(on_move_start) = self.on_move_start.as_mut() {
            on_move_start(&mv);
        }
        events.push(BotEvent::MoveStarted(mv));
        events
    }

    /// Commit the scheduled move if `token` is still the current timer and
    /// nothing moved underneath it.
    pub fn on_timer_fired(
        &mut self,
        token: TimerToken,
        game: &mut impl GameFacade,
        engine: &impl EngineFacade,
    ) -> Vec<BotEvent> {
        let mut events = Vec::new();
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.handle.token() == token);
        if !is_current {
            tracing::trace!(?token, "Ignoring superseded timer");
            return events;
        }
        let Some(pending) = self.pending.take() else {
            return events;
        };
        self.position_awaiting_move = None;

        let live_fen = game.current_fen();
        if live_fen != pending.fen
            || engine.info().analyzed_fen != pending.analyzed_fen
            || game.is_game_over()
        {
            tracing::debug!("Position moved on before the commit, dropping it");
            self.has_moved_for_position = false;
            self.phase = BotPhase::AwaitingEngine;
            return events;
        }

        match game.make_move_san(&pending.mv.san) {
            Ok(entry) => {
                tracing::info!(san = %entry.san, "Bot move committed");
                self.announcement = Some(format!("Bot plays {}", entry.san));
                self.last_move = Some(pending.mv.clone());
                self.error = None;
                self.phase = BotPhase::Idle;
                if let Some(on_move_complete) = self.on_move_complete.as_mut() {
                    on_move_complete(&pending.mv);
                }
                events.push(BotEvent::MoveCompleted(pending.mv));
            }
            Err(e) => {
                self.has_moved_for_position = false;
                self.rejected = Some(engine.info().clone());
                let error = BotError::IllegalMove {
                    san: pending.mv.san,
                    reason: e.to_string(),
                };
                self.fail(error, &mut events);
            }
        }
        events
    }

    /// Apply new settings. Any pending commit is dropped.
    pub fn set_config(&mut self, config: BotConfig) -> Result<(), BotError> {
        validate(&config)?;
        self.clear_attempt();
        self.rejected = None;
        self.config = config;
        self.phase = BotPhase::Idle;
        Ok(())
    }

    /// Drop any pending commit and forget the current position.
    pub fn stop(&mut self) {
        self.clear_attempt();
        self.observed_fen = None;
        self.phase = BotPhase::Idle;
    }

    fn clear_attempt(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.cancel();
        }
        self.position_awaiting_move = None;
        self.has_moved_for_position = false;
    }

    fn fail(&mut self, error: BotError, events: &mut Vec<BotEvent>) {
        tracing::warn!("Bot error: {}", error);
        self.has_moved_for_position = false;
        self.phase = BotPhase::Error;
        self.error = Some(error.clone());
        if let Some(on_error) = self.on_error.as_mut() {
            on_error(&error);
        }
        events.push(BotEvent::Error(error));
    }
}

impl<S: Scheduler> Drop for BotController<S> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.cancel();
        }
    }
}

fn validate(config: &BotConfig) -> Result<(), BotError> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&config.level) {
        return Err(BotError::Configuration(format!(
            "level must be between {} and {}, got {}",
            MIN_LEVEL, MAX_LEVEL, config.level
        )));
    }
    Ok(())
}

pub struct BotControllerBuilder<S> {
    config: BotConfig,
    scheduler: Option<S>,
    seed: Option<u64>,
    on_move_start: Option<MoveCallback>,
    on_move_complete: Option<MoveCallback>,
    on_error: Option<ErrorCallback>,
}

impl<S: Scheduler> Default for BotControllerBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> BotControllerBuilder<S> {
    pub fn new() -> Self {
        Self {
            config: BotConfig::default(),
            scheduler: None,
            seed: None,
            on_move_start: None,
            on_move_complete: None,
            on_error: None,
        }
    }

    pub fn config(mut self, config: BotConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scheduler(mut self, scheduler: S) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Fix the random source for reproducible selection.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn on_move_start(mut self, f: impl FnMut(&PvMove) + Send + 'static) -> Self {
        self.on_move_start = Some(Box::new(f));
        self
    }

    pub fn on_move_complete(mut self, f: impl FnMut(&PvMove) + Send + 'static) -> Self {
        self.on_move_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&BotError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<BotController<S>, BotError> {
        let scheduler = self
            .scheduler
            .ok_or_else(|| BotError::Configuration("a scheduler is required".into()))?;
        validate(&self.config)?;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(BotController {
            config: self.config,
            scheduler,
            rng,
            observed_fen: None,
            position_awaiting_move: None,
            has_moved_for_position: false,
            rejected: None,
            pending: None,
            phase: BotPhase::Idle,
            last_move: None,
            error: None,
            announcement: None,
            on_move_start: self.on_move_start,
            on_move_complete: self.on_move_complete,
            on_error: self.on_error,
        })
    }
}
