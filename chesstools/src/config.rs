//! Runtime configuration for chesstools.
//!
//! Every tunable has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags take precedence over
//! both where a subcommand exposes one.

use std::path::PathBuf;
use std::time::Duration;

/// Default pause before a bot commits its chosen move (in milliseconds).
const DEFAULT_MOVE_DELAY_MS: u64 = 500;

/// Default ply cap after which a bot-vs-bot game is adjudicated a draw.
const DEFAULT_MAX_PLIES: usize = 300;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Get an explicit Stockfish binary.
///
/// Priority:
/// 1. `CHESSTOOLS_STOCKFISH_PATH` env variable if set
/// 2. `None`, letting the engine search the usual install locations
pub fn get_stockfish_path() -> Option<PathBuf> {
    std::env::var_os("CHESSTOOLS_STOCKFISH_PATH").map(PathBuf::from)
}

/// Get the bot move delay.
///
/// Priority:
/// 1. `CHESSTOOLS_MOVE_DELAY_MS` env variable if set (falls back to default
///    if the value cannot be parsed as a `u64`)
/// 2. `500` milliseconds as fallback
pub fn get_move_delay() -> Duration {
    Duration::from_millis(parse_or(
        std::env::var("CHESSTOOLS_MOVE_DELAY_MS").ok(),
        DEFAULT_MOVE_DELAY_MS,
    ))
}

/// Get the ply cap for bot-vs-bot games.
///
/// Priority:
/// 1. `CHESSTOOLS_MAX_PLIES` env variable if set (falls back to default if
///    the value cannot be parsed)
/// 2. `300` plies as fallback
pub fn get_max_plies() -> usize {
    parse_or(std::env::var("CHESSTOOLS_MAX_PLIES").ok(), DEFAULT_MAX_PLIES)
}

/// Get the directory for daily rotated log files.
///
/// When unset, logs go to stderr.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var_os("CHESSTOOLS_LOG_DIR").map(PathBuf::from)
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or(None, 7u64), 7);
        assert_eq!(parse_or(Some("12".into()), 7u64), 12);
        assert_eq!(parse_or(Some(" 40 ".into()), 7usize), 40);
        assert_eq!(parse_or(Some("fast".into()), 7u64), 7);
        assert_eq!(parse_or(Some("-3".into()), 7u64), 7);
    }

    #[test]
    fn test_get_move_delay() {
        let delay = get_move_delay();
        match std::env::var("CHESSTOOLS_MOVE_DELAY_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(ms) => assert_eq!(delay, Duration::from_millis(ms)),
            None => assert_eq!(delay, Duration::from_millis(DEFAULT_MOVE_DELAY_MS)),
        }
    }

    #[test]
    fn test_get_max_plies() {
        let plies = get_max_plies();
        match std::env::var("CHESSTOOLS_MAX_PLIES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            Some(n) => assert_eq!(plies, n),
            None => assert_eq!(plies, DEFAULT_MAX_PLIES),
        }
    }

    #[test]
    fn test_get_stockfish_path() {
        let path = get_stockfish_path();
        match std::env::var_os("CHESSTOOLS_STOCKFISH_PATH") {
            Some(val) => assert_eq!(path, Some(PathBuf::from(val))),
            None => assert_eq!(path, None),
        }
    }
}
