//! `chesstools tournament`: round-robin bot games between difficulty levels.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use bot::{
    benchmark_preset, run_game, GameRecord, GameSettings, PairStats, Slot, TournamentConfig,
    TournamentScheduler,
};
use engine::{AnalysisSession, StockfishConfig};
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct TournamentArgs {
    pub config: TournamentConfig,
    /// Games to start before the tournament stops scheduling.
    pub games: u32,
    pub settings: GameSettings,
    pub stockfish_path: Option<PathBuf>,
    pub json: bool,
}

pub async fn run(args: TournamentArgs) -> anyhow::Result<()> {
    let config = TournamentConfig {
        concurrency: args.config.concurrency.min(args.games.max(1) as usize),
        ..args.config
    };
    let mut scheduler = TournamentScheduler::new(config)?;
    let mut games: JoinSet<(Slot, anyhow::Result<GameRecord>)> = JoinSet::new();
    let mut started = 0u32;

    for slot in scheduler.start() {
        started += 1;
        games.spawn(play_slot(slot, args.settings, args.stockfish_path.clone()));
    }
    if started >= args.games {
        scheduler.stop();
    }

    while let Some(joined) = games.join_next().await {
        let (slot, record) = joined.context("game task panicked")?;
        let record = record.with_context(|| {
            format!(
                "game {} (level {} vs level {}) failed",
                slot.game_key, slot.matchup.white, slot.matchup.black
            )
        })?;
        println!(
            "[{}/{}] level {} vs level {}: {:?} in {} plies",
            scheduler.total_games() + 1,
            args.games,
            slot.matchup.white,
            slot.matchup.black,
            record.outcome,
            record.moves.len()
        );

        let next = scheduler.record_result(
            slot.slot_id,
            slot.matchup.white,
            slot.matchup.black,
            record.outcome,
        );
        if let Some(slot) = next {
            started += 1;
            if started >= args.games {
                scheduler.stop();
            }
            games.spawn(play_slot(slot, args.settings, args.stockfish_path.clone()));
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(scheduler.results())?);
    } else {
        print!("{}", format_matrix(&scheduler, config));
    }
    Ok(())
}

/// One game on fresh engines, so levels never share search state.
async fn play_slot(
    slot: Slot,
    settings: GameSettings,
    path: Option<PathBuf>,
) -> (Slot, anyhow::Result<GameRecord>) {
    let result = play(&slot, settings, path).await;
    (slot, result)
}

async fn play(
    slot: &Slot,
    settings: GameSettings,
    path: Option<PathBuf>,
) -> anyhow::Result<GameRecord> {
    let spawn = |side: &str| {
        AnalysisSession::spawn(StockfishConfig {
            path: path.clone(),
            label: Some(format!("slot{}-{}", slot.slot_id, side)),
            ..Default::default()
        })
    };
    let mut white = spawn("white").await.context("failed to start Stockfish")?;
    let mut black = spawn("black").await.context("failed to start Stockfish")?;

    let record = run_game(
        slot.matchup.white,
        slot.matchup.black,
        (&mut white, &mut black),
        settings,
    )
    .await;
    white.shutdown().await;
    black.shutdown().await;
    Ok(record?)
}

fn format_cell(stats: &PairStats) -> String {
    format!("+{} ={} -{}", stats.white_wins, stats.draws, stats.black_wins)
}

/// Results as a white-by-black table, each cell from white's side.
fn format_matrix(scheduler: &TournamentScheduler, config: TournamentConfig) -> String {
    let levels: Vec<u8> = (config.min_level..=config.max_level).collect();
    let width = 12;
    let mut out = String::new();

    let _ = write!(out, "{:<16}", "white \\ black");
    for level in &levels {
        let _ = write!(out, "{:>width$}", level);
    }
    let _ = writeln!(out, "{:>width$}", "total");

    for (row, white) in scheduler.results_matrix().iter().zip(&levels) {
        let name = benchmark_preset(*white)
            .map(|p| format!("{} {}", white, p.description))
            .unwrap_or_else(|| white.to_string());
        let _ = write!(out, "{:<16}", name);
        for cell in row {
            let text = cell.as_ref().map(format_cell).unwrap_or_else(|| "-".into());
            let _ = write!(out, "{:>width$}", text);
        }
        let _ = writeln!(out, "{:>width$}", format_cell(&scheduler.total_for_row(*white)));
    }
    out
}
