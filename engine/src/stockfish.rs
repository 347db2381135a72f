use crate::uci::{format_uci_move, parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineError, EngineEvent};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

/// Configuration for spawning and tuning the engine process.
#[derive(Debug, Clone, Default)]
pub struct StockfishConfig {
    /// Explicit binary; searched in common locations when unset.
    pub path: Option<PathBuf>,
    pub skill_level: Option<u8>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Shown in logs to tell concurrent engines apart.
    pub label: Option<String>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance with full configuration.
    #[tracing::instrument(level = "info", skip(config), fields(label = ?config.label))]
    pub async fn spawn_with_config(config: StockfishConfig) -> Result<Self, EngineError> {
        let path = match config.path.clone() {
            Some(path) => path,
            None => find_stockfish_path().ok_or(EngineError::NotFound)?,
        };
        tracing::info!("Starting Stockfish at {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                EngineError::Spawn(e)
            })?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("engine has no stdin")))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("engine has no stdout")))?;

        tracing::debug!("Sending 'uci' command");
        stdin.write_all(b"uci\n").await?;
        stdin.flush().await?;

        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(256);

        // Output reader task
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Stockfish stdout EOF - engine closed");
                        let _ = event_tx
                            .send(EngineEvent::Error("engine process exited".into()))
                            .await;
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => {
                                tracing::debug!("Received bestmove: {:?}", mv);
                                EngineEvent::BestMove(mv)
                            }
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Ok(UciMessage::Id { .. }) => continue,
                            Err(_) => {
                                tracing::trace!("Ignoring UCI line: {}", trimmed);
                                continue;
                            }
                        };

                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        // Wait for uciok
        let handshake = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
            while let Some(event) = event_rx.recv().await {
                if matches!(event, EngineEvent::Ready) {
                    return Ok(());
                }
            }
            Err(EngineError::Closed)
        })
        .await;
        match handshake {
            Ok(Ok(())) => tracing::debug!("Received uciok, engine ready"),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::error!("Timeout waiting for uciok");
                return Err(EngineError::Timeout(HANDSHAKE_TIMEOUT));
            }
        }

        let mut options = Vec::new();
        if let Some(level) = config.skill_level {
            options.push(("Skill Level", level.min(20).to_string()));
        }
        if let Some(threads) = config.threads {
            options.push(("Threads", threads.clamp(1, 16).to_string()));
        }
        if let Some(hash_mb) = config.hash_mb {
            options.push(("Hash", hash_mb.clamp(1, 2048).to_string()));
        }
        for (name, value) in options {
            tracing::info!("Setting {} to {}", name, value);
            stdin
                .write_all(format!("setoption name {} value {}\n", name, value).as_bytes())
                .await?;
        }
        stdin.write_all(b"isready\n").await?;
        stdin.flush().await?;

        // Command processor task: serialises commands onto stdin
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                let quit = matches!(cmd, EngineCommand::Quit);
                let line = command_line(&cmd);
                tracing::trace!("UCI >> {}", line.trim());

                if let Err(e) = stdin.write_all(line.as_bytes()).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush stdin: {}", e);
                    break;
                }
                if quit {
                    break;
                }
            }
            tracing::debug!("Command processor task exiting");
        });

        tracing::info!("Stockfish engine spawned and initialized");
        Ok(Self {
            process,
            command_tx,
            event_rx,
        })
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        tracing::debug!("Queueing command: {:?}", cmd);
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Receive an event from the engine
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

/// Render a command as the UCI line sent to the engine.
pub fn command_line(cmd: &EngineCommand) -> String {
    match cmd {
        EngineCommand::SetPosition { fen, moves } => {
            let mut line = format!("position fen {}", fen);
            if !moves.is_empty() {
                line.push_str(" moves");
                for mv in moves {
                    line.push(' ');
                    line.push_str(&format_uci_move(mv));
                }
            }
            line.push('\n');
            line
        }
        EngineCommand::SetOption { name, value } => match value {
            Some(val) => format!("setoption name {} value {}\n", name, val),
            None => format!("setoption name {}\n", name),
        },
        EngineCommand::Go(params) => {
            let mut line = "go".to_string();
            if let Some(depth) = params.depth {
                line.push_str(&format!(" depth {}", depth));
            }
            if let Some(movetime) = params.movetime {
                line.push_str(&format!(" movetime {}", movetime));
            }
            if params.infinite {
                line.push_str(" infinite");
            } else if params.depth.is_none() && params.movetime.is_none() {
                line.push_str(" movetime 1000");
            }
            line.push('\n');
            line
        }
        EngineCommand::Stop => "stop\n".to_string(),
        EngineCommand::Quit => "quit\n".to_string(),
    }
}

/// Find Stockfish executable in common locations
pub fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // Fall back to PATH lookup
    std::process::Command::new("stockfish")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .arg("quit")
        .status()
        .ok()
        .map(|_| PathBuf::from("stockfish"))
}
