//! A live engine paired with the analysis snapshot built from its output.

use crate::analysis::{AnalysisInfo, AnalysisRequest, AnalysisState, EngineFacade, EngineStatus};
use crate::stockfish::{StockfishConfig, StockfishEngine};
use crate::{EngineCommand, EngineError, EngineEvent, GoParams};

pub struct AnalysisSession {
    engine: StockfishEngine,
    state: AnalysisState,
    multi_pv: u8,
    skill_level: Option<u8>,
}

impl AnalysisSession {
    pub async fn spawn(config: StockfishConfig) -> Result<Self, EngineError> {
        let skill_level = config.skill_level;
        let engine = StockfishEngine::spawn_with_config(config).await?;
        let mut state = AnalysisState::new();
        state.apply(&EngineEvent::Ready);
        Ok(Self {
            engine,
            state,
            multi_pv: 1,
            skill_level,
        })
    }

    /// Start analyzing `request.fen`, interrupting any search still running.
    #[tracing::instrument(level = "debug", skip(self), fields(fen = %request.fen))]
    pub async fn analyze(&mut self, request: &AnalysisRequest) -> Result<(), EngineError> {
        if self.state.info().is_engine_thinking {
            self.engine.send_command(EngineCommand::Stop).await?;
        }

        let settings = request.settings;
        let multi_pv = settings.multi_pv.max(1);
        if multi_pv != self.multi_pv {
            self.set_option("MultiPV", multi_pv.to_string()).await?;
            self.multi_pv = multi_pv;
        }
        if let Some(level) = settings.skill_level {
            if self.skill_level != Some(level) {
                self.set_option("Skill Level", level.min(20).to_string())
                    .await?;
                self.skill_level = Some(level);
            }
        }

        self.state.begin(&request.fen, multi_pv)?;
        self.engine
            .send_command(EngineCommand::SetPosition {
                fen: request.fen.clone(),
                moves: Vec::new(),
            })
            .await?;
        self.engine
            .send_command(EngineCommand::Go(GoParams {
                movetime: settings.move_time,
                depth: settings.depth,
                infinite: false,
            }))
            .await
    }

    async fn set_option(&self, name: &str, value: String) -> Result<(), EngineError> {
        tracing::debug!("Setting {} to {}", name, value);
        self.engine
            .send_command(EngineCommand::SetOption {
                name: name.to_string(),
                value: Some(value),
            })
            .await
    }

    /// True while a search for exactly `fen` is running.
    pub fn is_analyzing(&self, fen: &str) -> bool {
        let info = self.state.info();
        info.is_engine_thinking && info.analyzed_fen == fen
    }

    /// Wait for the next engine event. `None` once the engine has gone away.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.engine.recv_event().await
    }

    /// Fold an event into the snapshot. Returns true if the snapshot changed.
    pub fn apply_event(&mut self, event: &EngineEvent) -> bool {
        self.state.apply(event)
    }

    /// Wait until the engine publishes new analysis. Errors if the engine exits.
    pub async fn changed(&mut self) -> Result<(), EngineError> {
        loop {
            let event = self.next_event().await.ok_or(EngineError::ChannelClosed)?;
            if self.apply_event(&event) {
                if self.state.info().status == EngineStatus::Error {
                    return Err(EngineError::Closed);
                }
                return Ok(());
            }
        }
    }

    pub async fn shutdown(self) {
        self.engine.shutdown().await;
    }
}

impl EngineFacade for AnalysisSession {
    fn info(&self) -> &AnalysisInfo {
        self.state.info()
    }
}
