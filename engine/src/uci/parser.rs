use crate::{EngineInfo, Score};
use cozy_chess::Move;

/// A line of engine output the session cares about.
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`, sent when there is no legal move.
    BestMove { mv: Option<Move>, ponder: Option<Move> },
    Info(EngineInfo),
}

/// Parse one line of engine output.
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let mut tokens = line.split_whitespace();
    let malformed = || crate::UciError::MalformedMessage(line.to_string());

    match tokens.next() {
        Some("uciok") => Ok(UciMessage::UciOk),
        Some("readyok") => Ok(UciMessage::ReadyOk),
        Some("id") => {
            let name = tokens.next().ok_or_else(malformed)?.to_string();
            let value = tokens.collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                return Err(malformed());
            }
            Ok(UciMessage::Id { name, value })
        }
        Some("bestmove") => {
            let mv = match tokens.next().ok_or_else(malformed)? {
                "(none)" | "0000" => None,
                token => Some(parse_uci_move(token)?),
            };
            let ponder = match (tokens.next(), tokens.next()) {
                (Some("ponder"), Some(token)) => parse_uci_move(token).ok(),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }
        Some("info") => Ok(UciMessage::Info(parse_info(tokens))),
        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

fn parse_info<'a>(tokens: impl Iterator<Item = &'a str>) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut tokens = tokens.peekable();

    while let Some(key) = tokens.next() {
        match key {
            "depth" => info.depth = next_num(&mut tokens),
            "seldepth" => info.seldepth = next_num(&mut tokens),
            "time" => info.time_ms = next_num(&mut tokens),
            "nodes" => info.nodes = next_num(&mut tokens),
            "nps" => info.nps = next_num(&mut tokens),
            "hashfull" => info.hashfull = next_num(&mut tokens),
            "multipv" => info.multipv = next_num(&mut tokens),
            "currmove" => info.currmove = tokens.next().and_then(|t| parse_uci_move(t).ok()),
            "score" => {
                info.score = match (tokens.next(), next_num::<i32>(&mut tokens)) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                    _ => None,
                };
                if tokens
                    .next_if(|t| *t == "lowerbound" || *t == "upperbound")
                    .is_some()
                {
                    info.bound = true;
                }
            }
            "pv" => {
                while let Some(token) = tokens.next_if(|t| !is_keyword(t)) {
                    if let Ok(mv) = parse_uci_move(token) {
                        info.pv.push(mv);
                    }
                }
            }
            "string" => {
                // Free text runs to end of line
                info.string = Some(tokens.by_ref().collect::<Vec<_>>().join(" "));
            }
            _ => {}
        }
    }

    info
}

fn next_num<'a, T: std::str::FromStr>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<T> {
    tokens.next().and_then(|t| t.parse().ok())
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// "e2e4" / "e7e8q" into a move.
pub fn parse_uci_move(s: &str) -> Result<Move, crate::UciError> {
    chess::parse_uci_move(s).map_err(|_| crate::UciError::InvalidMove(s.to_string()))
}

/// A move as its UCI text.
pub fn format_uci_move(mv: &Move) -> String {
    chess::format_uci_move(*mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove { mv, ponder } => {
                assert_eq!(format_uci_move(&mv.unwrap()), "e2e4");
                assert_eq!(format_uci_move(&ponder.unwrap()), "e7e5");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_uci_message("bestmove (none)").unwrap();
        assert!(matches!(msg, UciMessage::BestMove { mv: None, .. }));
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5").unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert!(matches!(info.score, Some(Score::Centipawns(35))));
                assert_eq!(info.nodes, Some(15234));
                assert_eq!(info.pv.len(), 2);
                assert!(!info.bound);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_multipv_mate_info() {
        let line = "info depth 20 seldepth 4 multipv 2 score mate -3 nodes 100 nps 1000 time 5 pv h7h8 g7g8";
        let UciMessage::Info(info) = parse_uci_message(line).unwrap() else {
            panic!("expected info");
        };
        assert_eq!(info.multipv, Some(2));
        assert!(matches!(info.score, Some(Score::Mate(-3))));
        assert_eq!(info.time_ms, Some(5));
        assert_eq!(info.pv.len(), 2);
    }

    #[test]
    fn test_parse_bound_score() {
        let line = "info depth 9 multipv 1 score cp 20 lowerbound nodes 10 pv d2d4";
        let UciMessage::Info(info) = parse_uci_message(line).unwrap() else {
            panic!("expected info");
        };
        assert!(info.bound);
        assert_eq!(info.nodes, Some(10));
        assert_eq!(info.pv.len(), 1);
    }

    #[test]
    fn test_parse_info_string() {
        let line = "info string NNUE evaluation using nn-abc.nnue enabled";
        let UciMessage::Info(info) = parse_uci_message(line).unwrap() else {
            panic!("expected info");
        };
        assert_eq!(
            info.string.as_deref(),
            Some("NNUE evaluation using nn-abc.nnue enabled")
        );
    }

    #[test]
    fn test_unknown_and_malformed_messages() {
        assert!(parse_uci_message("option name Hash type spin").is_err());
        assert!(parse_uci_message("bestmove").is_err());
        assert!(parse_uci_message("id name").is_err());
        let Ok(UciMessage::Id { name, value }) = parse_uci_message("id name Stockfish 16") else {
            panic!("expected id");
        };
        assert_eq!((name.as_str(), value.as_str()), ("name", "Stockfish 16"));
    }
}
