//! chesstools - terminal front end for scripted puzzles and engine bots.
//!
//! Three subcommands share one runtime:
//!
//! - **`puzzle`**: load a puzzle file and solve it move by move on stdin,
//!   with hints rendered as highlighted squares.
//! - **`play`**: play a game against the Stockfish-backed bot at one of the
//!   eight difficulty levels.
//! - **`tournament`**: run bot-vs-bot games across a range of levels and
//!   print the results table.
//!
//! Runtime tunables (engine path, move delay, ply cap, log directory) are read
//! from environment variables, see [`config`].

use std::path::PathBuf;

use bot::{BotConfig, GameSettings, TournamentConfig};
use chess::PlayerSide;
use clap::{Parser, Subcommand};
use engine::StockfishConfig;
use puzzle::PuzzleOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod play;
mod puzzles;
mod tournament;

#[derive(Parser)]
#[command(name = "chesstools", about = "Chess puzzles and engine bots in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve puzzles from a JSON file.
    Puzzle {
        /// A single puzzle object or an array of them.
        file: PathBuf,
        /// 1-based puzzle to start from.
        #[arg(short, long, default_value_t = 1)]
        start: usize,
        /// Only accept the scripted line, even when another move mates.
        #[arg(long)]
        strict: bool,
    },
    /// Play against the bot.
    Play {
        /// Side the bot plays.
        #[arg(long, default_value = "black")]
        bot: PlayerSide,
        /// Difficulty level, 1 to 8.
        #[arg(short, long, default_value_t = 5)]
        level: u8,
        /// 0 always plays the best move, higher values mix in weaker lines.
        #[arg(short, long, default_value_t = 0)]
        randomness: u8,
    },
    /// Run bot-vs-bot games between difficulty levels.
    Tournament {
        #[arg(long, default_value_t = 1)]
        min: u8,
        #[arg(long, default_value_t = 8)]
        max: u8,
        /// Games played at the same time.
        #[arg(short, long, default_value_t = 2)]
        concurrency: usize,
        /// Games to play in total.
        #[arg(short, long, default_value_t = 56)]
        games: u32,
        #[arg(short, long, default_value_t = 0)]
        randomness: u8,
        /// Print results as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

/// Log to `CHESSTOOLS_LOG_DIR` when set, otherwise to stderr.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    match config::get_log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir).ok();
            let appender = tracing_appender::rolling::daily(dir, "chesstools.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Puzzle {
            file,
            start,
            strict,
        } => {
            let options = PuzzleOptions {
                solve_on_checkmate: !strict,
            };
            puzzles::run(&file, start.saturating_sub(1), options).await?;
        }
        Commands::Play {
            bot,
            level,
            randomness,
        } => {
            let config = BotConfig {
                play_as: bot,
                move_delay: config::get_move_delay(),
                randomness,
                level,
            };
            play::run(config, stockfish_config("bot")).await?;
        }
        Commands::Tournament {
            min,
            max,
            concurrency,
            games,
            randomness,
            json,
        } => {
            let args = tournament::TournamentArgs {
                config: TournamentConfig {
                    min_level: min,
                    max_level: max,
                    concurrency,
                },
                games,
                settings: GameSettings {
                    move_delay: config::get_move_delay(),
                    max_plies: config::get_max_plies(),
                    randomness,
                },
                stockfish_path: config::get_stockfish_path(),
                json,
            };
            tournament::run(args).await?;
        }
    }

    Ok(())
}

fn stockfish_config(label: &str) -> StockfishConfig {
    StockfishConfig {
        path: config::get_stockfish_path(),
        label: Some(label.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["chesstools", "play", "--bot", "white", "-l", "3"]).unwrap();
        match cli.command {
            Commands::Play { bot, level, randomness } => {
                assert_eq!(bot, PlayerSide::White);
                assert_eq!(level, 3);
                assert_eq!(randomness, 0);
            }
            _ => panic!("expected play"),
        }

        let cli = Cli::try_parse_from(["chesstools", "tournament", "--min", "2", "--max", "4"]).unwrap();
        match cli.command {
            Commands::Tournament { min, max, concurrency, .. } => {
                assert_eq!((min, max, concurrency), (2, 4, 2));
            }
            _ => panic!("expected tournament"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_side() {
        assert!(Cli::try_parse_from(["chesstools", "play", "--bot", "green"]).is_err());
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
