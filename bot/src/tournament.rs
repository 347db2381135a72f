//! Round-robin-ish scheduling of bot-vs-bot games across difficulty levels.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::error::BotError;
use crate::presets::{MAX_LEVEL, MIN_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentConfig {
    pub min_level: u8,
    pub max_level: u8,
    /// Games played at the same time.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Matchup {
    pub white: u8,
    pub black: u8,
}

impl Matchup {
    /// Ordered `"white-black"` key.
    pub fn key(&self) -> String {
        format!("{}-{}", self.white, self.black)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub slot_id: usize,
    pub matchup: Matchup,
    /// Fresh for every game so a restarted slot is never confused with its predecessor.
    pub game_key: Uuid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairStats {
    pub white_wins: u32,
    pub black_wins: u32,
    pub draws: u32,
    pub total: u32,
}

impl PairStats {
    fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::WhiteWins => self.white_wins += 1,
            GameOutcome::BlackWins => self.black_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
        self.total += 1;
    }

    fn add(&mut self, other: &PairStats) {
        self.white_wins += other.white_wins;
        self.black_wins += other.black_wins;
        self.draws += other.draws;
        self.total += other.total;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LastResult {
    pub matchup: Matchup,
    pub outcome: GameOutcome,
}

pub struct TournamentScheduler {
    config: TournamentConfig,
    rng: StdRng,
    is_running: bool,
    total_games: u32,
    active_slots: Vec<Slot>,
    last_result: Option<LastResult>,
    results: BTreeMap<String, PairStats>,
}

impl TournamentScheduler {
    pub fn new(config: TournamentConfig) -> Result<Self, BotError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: TournamentConfig, seed: u64) -> Result<Self, BotError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: TournamentConfig, rng: StdRng) -> Result<Self, BotError> {
        if config.min_level < MIN_LEVEL || config.max_level > MAX_LEVEL {
            return Err(BotError::Configuration(format!(
                "levels must be within {}..={}",
                MIN_LEVEL, MAX_LEVEL
            )));
        }
        if config.min_level >= config.max_level {
            return Err(BotError::Configuration(
                "at least two levels are needed for a pairing".into(),
            ));
        }
        if config.concurrency == 0 {
            return Err(BotError::Configuration("concurrency must be at least 1".into()));
        }
        Ok(Self {
            config,
            rng,
            is_running: false,
            total_games: 0,
            active_slots: Vec::new(),
            last_result: None,
            results: BTreeMap::new(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn total_games(&self) -> u32 {
        self.total_games
    }

    pub fn active_slots(&self) -> &[Slot] {
        &self.active_slots
    }

    pub fn last_result(&self) -> Option<LastResult> {
        self.last_result
    }

    pub fn results(&self) -> &BTreeMap<String, PairStats> {
        &self.results
    }

    fn levels(&self) -> std::ops::RangeInclusive<u8> {
        self.config.min_level..=self.config.max_level
    }

    /// Every ordered pairing of two different levels.
    pub fn pairings(&self) -> Vec<Matchup> {
        self.levels()
            .flat_map(|white| {
                self.levels()
                    .filter(move |black| *black != white)
                    .map(move |black| Matchup { white, black })
            })
            .collect()
    }

    /// Pick the next game: an unplayed pairing not already on the board if
    /// possible, otherwise any pairing not on the board, otherwise any pairing.
    pub fn next_matchup(&mut self) -> Option<Matchup> {
        let pairings = self.pairings();
        let active: Vec<Matchup> = self.active_slots.iter().map(|s| s.matchup).collect();
        let idle: Vec<Matchup> = pairings
            .iter()
            .copied()
            .filter(|m| !active.contains(m))
            .collect();
        let unplayed: Vec<Matchup> = idle
            .iter()
            .copied()
            .filter(|m| !self.results.contains_key(&m.key()))
            .collect();

        let pool = if !unplayed.is_empty() {
            unplayed
        } else if !idle.is_empty() {
            idle
        } else {
            pairings
        };
        pool.choose(&mut self.rng).copied()
    }

    /// Fill every free slot. Returns the slots that were started.
    pub fn start(&mut self) -> Vec<Slot> {
        tracing::info!(
            min = self.config.min_level,
            max = self.config.max_level,
            concurrency = self.config.concurrency,
            "Tournament started"
        );
        self.is_running = true;
        let mut started = Vec::new();
        while let Some(slot) = self.fill_slot() {
            started.push(slot);
        }
        started
    }

    fn fill_slot(&mut self) -> Option<Slot> {
        if !self.is_running || self.active_slots.len() >= self.config.concurrency {
            return None;
        }
        let slot_id = (0..self.config.concurrency)
            .find(|id| self.active_slots.iter().all(|s| s.slot_id != *id))?;
        let matchup = self.next_matchup()?;
        let slot = Slot {
            slot_id,
            matchup,
            game_key: Uuid::new_v4(),
        };
        tracing::debug!(slot_id, key = %matchup.key(), "Slot filled");
        self.active_slots.push(slot.clone());
        Some(slot)
    }

    /// Count a finished game, free its slot and refill it while running.
    pub fn record_result(
        &mut self,
        slot_id: usize,
        white: u8,
        black: u8,
        outcome: GameOutcome,
    ) -> Option<Slot> {
        let matchup = Matchup { white, black };
        self.results.entry(matchup.key()).or_default().record(outcome);
        self.total_games += 1;
        self.last_result = Some(LastResult { matchup, outcome });
        tracing::info!(key = %matchup.key(), ?outcome, total = self.total_games, "Game recorded");

        let before = self.active_slots.len();
        self.active_slots.retain(|s| s.slot_id != slot_id);
        if self.active_slots.len() == before {
            tracing::warn!(slot_id, "Result for a slot that was not active");
        }
        self.fill_slot()
    }

    /// Halt scheduling. Games in flight keep their slots until reported,
    /// and results are kept.
    pub fn stop(&mut self) {
        self.is_running = false;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.active_slots.clear();
        self.results.clear();
        self.total_games = 0;
        self.last_result = None;
    }

    /// Stats indexed `[white][black]` from `min_level`. The diagonal is `None`.
    pub fn results_matrix(&self) -> Vec<Vec<Option<PairStats>>> {
        self.levels()
            .map(|white| {
                self.levels()
                    .map(|black| {
                        if white == black {
                            None
                        } else {
                            let key = Matchup { white, black }.key();
                            Some(self.results.get(&key).copied().unwrap_or_default())
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Totals for every game `white` played as white.
    pub fn total_for_row(&self, white: u8) -> PairStats {
        let mut total = PairStats::default();
        for black in self.levels().filter(|b| *b != white) {
            if let Some(stats) = self.results.get(&Matchup { white, black }.key()) {
                total.add(stats);
            }
        }
        total
    }
}
