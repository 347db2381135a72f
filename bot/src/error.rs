#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BotError {
    #[error("no valid move found from engine analysis")]
    NoMoveFound,
    #[error("engine move {san} was rejected: {reason}")]
    IllegalMove { san: String, reason: String },
    #[error("bot misconfigured: {0}")]
    Configuration(String),
}

/// Why a bot-vs-bot game could not be played to the end.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Bot error: {0}")]
    Bot(#[from] BotError),
    #[error("Engine error: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("Timer channel closed")]
    TimersClosed,
}
