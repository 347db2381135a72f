//! Fixed difficulty tables.

use engine::EngineSettings;
use serde::Serialize;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 8;

/// Engine limits used when the bot plays at a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BotPreset {
    pub depth: u8,
    pub skill_level: u8,
    /// Milliseconds.
    pub move_time: u64,
}

/// Search depth and approximate strength for benchmarking runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkPreset {
    pub depth: u8,
    pub elo: u32,
    pub description: &'static str,
}

#[rustfmt::skip]
const BOT_PRESETS: [BotPreset; 8] = [
    BotPreset { depth: 1, skill_level: 0, move_time: 50 },
    BotPreset { depth: 2, skill_level: 3, move_time: 100 },
    BotPreset { depth: 4, skill_level: 6, move_time: 200 },
    BotPreset { depth: 6, skill_level: 9, move_time: 300 },
    BotPreset { depth: 8, skill_level: 12, move_time: 500 },
    BotPreset { depth: 10, skill_level: 15, move_time: 750 },
    BotPreset { depth: 14, skill_level: 18, move_time: 1000 },
    BotPreset { depth: 18, skill_level: 20, move_time: 1500 },
];

#[rustfmt::skip]
const BENCHMARK_PRESETS: [BenchmarkPreset; 8] = [
    BenchmarkPreset { depth: 1, elo: 800, description: "Beginner" },
    BenchmarkPreset { depth: 3, elo: 1000, description: "Novice" },
    BenchmarkPreset { depth: 5, elo: 1200, description: "Casual" },
    BenchmarkPreset { depth: 7, elo: 1400, description: "Club player" },
    BenchmarkPreset { depth: 9, elo: 1600, description: "Intermediate" },
    BenchmarkPreset { depth: 11, elo: 1800, description: "Advanced" },
    BenchmarkPreset { depth: 14, elo: 2000, description: "Expert" },
    BenchmarkPreset { depth: 18, elo: 2200, description: "Master" },
];

fn index(level: u8) -> Option<usize> {
    (MIN_LEVEL..=MAX_LEVEL)
        .contains(&level)
        .then(|| usize::from(level - MIN_LEVEL))
}

pub fn bot_preset(level: u8) -> Option<BotPreset> {
    index(level).map(|i| BOT_PRESETS[i])
}

pub fn benchmark_preset(level: u8) -> Option<BenchmarkPreset> {
    index(level).map(|i| BENCHMARK_PRESETS[i])
}

impl BotPreset {
    pub fn engine_settings(&self, multi_pv: u8) -> EngineSettings {
        EngineSettings {
            depth: Some(self.depth),
            skill_level: Some(self.skill_level),
            move_time: Some(self.move_time),
            multi_pv,
        }
    }
}
