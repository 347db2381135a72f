//! Engine-backed bot play: move selection, difficulty presets, the move
//! controller with its cancelable timers, and bot-vs-bot tournaments.

pub mod controller;
pub mod error;
pub mod presets;
pub mod runner;
pub mod scheduler;
pub mod selection;
pub mod tournament;

pub use controller::{BotConfig, BotController, BotControllerBuilder, BotEvent, BotPhase};
pub use error::{BotError, RunnerError};
pub use presets::{benchmark_preset, bot_preset, BenchmarkPreset, BotPreset};
pub use runner::{run_game, GameRecord, GameSettings};
pub use scheduler::{Scheduler, TimerFired, TimerHandle, TimerToken, TokioScheduler};
pub use selection::{multi_pv_count, select_move, select_move_with_rng, win_chance};
pub use tournament::{
    GameOutcome, LastResult, Matchup, PairStats, Slot, TournamentConfig, TournamentScheduler,
};
