//! Picking one move out of the engine's ranked lines.

use chess::PlayerSide;
use engine::{Evaluation, PrincipalVariation, PvMove};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Lines to request from the engine for a randomness level.
pub fn multi_pv_count(randomness: u8) -> u8 {
    if randomness == 0 {
        1
    } else {
        5
    }
}

/// White's chance of winning implied by an evaluation.
pub fn win_chance(evaluation: Option<Evaluation>) -> f64 {
    match evaluation {
        Some(Evaluation::Cp(cp)) => 1.0 / (1.0 + (-f64::from(cp) / 400.0).exp()),
        Some(Evaluation::Mate(m)) if m > 0 => 0.99,
        Some(Evaluation::Mate(m)) if m < 0 => 0.01,
        Some(Evaluation::Mate(_)) | None => 0.5,
    }
}

/// Selection weight of a line for the side to move.
fn weight(pv: &PrincipalVariation, randomness: u8, side: PlayerSide) -> f64 {
    if pv.moves.is_empty() {
        return 0.0;
    }
    let white = win_chance(pv.evaluation);
    let chance = match side {
        PlayerSide::White => white,
        PlayerSide::Black => 1.0 - white,
    };
    chance.powf(1.0 + f64::from(randomness) * 0.5)
}

/// Choose the move to play from `pvs` (sorted by rank).
///
/// Randomness 0 always returns the first move of the best line. Higher levels
/// draw one line at random, weighted by its win chance for `side`.
pub fn select_move(pvs: &[PrincipalVariation], randomness: u8, side: PlayerSide) -> Option<PvMove> {
    select_move_with_rng(pvs, randomness, side, &mut rand::thread_rng())
}

pub fn select_move_with_rng<R: Rng + ?Sized>(
    pvs: &[PrincipalVariation],
    randomness: u8,
    side: PlayerSide,
    rng: &mut R,
) -> Option<PvMove> {
    let best = pvs.first()?.moves.first()?;
    if randomness == 0 {
        return Some(best.clone());
    }

    let weights: Vec<f64> = pvs.iter().map(|pv| weight(pv, randomness, side)).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => pvs[dist.sample(rng)].moves.first().cloned(),
        Err(e) => {
            tracing::debug!("Falling back to best line: {}", e);
            Some(best.clone())
        }
    }
}
