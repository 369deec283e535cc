//! Dimension scorers — six pure functions over a user's transaction history.
//!
//! RULE: Scorers are total. An empty or sparse history produces a defined
//! fallback score, never an error. All window arithmetic is relative to the
//! caller-supplied `as_of` instant; nothing here reads the system clock.

use crate::{
    assessment::{Dimension, DimensionScore},
    config::DimensionWeights,
    transaction::{Transaction, TxnStatus},
    types::{round2, Score},
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};

// ── Window constants ─────────────────────────────────────────────────────────

/// Trailing window for frequency and growth scoring.
const HISTORY_WINDOW_DAYS: i64 = 365;
/// Growth compares the halves on either side of this split.
const GROWTH_SPLIT_DAYS: i64 = 180;
/// Short window shared by the velocity scorer and the fraud gate.
pub const VELOCITY_WINDOW_HOURS: i64 = 24;

// Fallback scores for empty histories.
const NEUTRAL_RETURNS_SCORE: Score = 50.0;
const NEUTRAL_VELOCITY_SCORE: Score = 60.0;

/// Score every dimension. The only entry point the orchestrator uses.
pub fn score_all(
    history: &[Transaction],
    as_of: DateTime<Utc>,
    weights: &DimensionWeights,
) -> BTreeMap<Dimension, DimensionScore> {
    Dimension::ALL
        .iter()
        .map(|d| (*d, score_dimension(*d, history, as_of, weights)))
        .collect()
}

pub fn score_dimension(
    dimension: Dimension,
    history: &[Transaction],
    as_of: DateTime<Utc>,
    weights: &DimensionWeights,
) -> DimensionScore {
    let (raw_value, normalized_score) = match dimension {
        Dimension::Frequency => frequency(history, as_of),
        Dimension::Redemption => redemption(history),
        Dimension::Diversification => diversification(history),
        Dimension::Growth => growth(history, as_of),
        Dimension::Returns => returns(history),
        Dimension::Velocity => velocity(history, as_of),
    };
    DimensionScore {
        dimension,
        raw_value,
        normalized_score,
        weight: weights.for_dimension(dimension),
    }
}

/// Count and aggregate amount within the trailing short window.
/// Shared between the velocity scorer and the fraud gate, which apply
/// different thresholds to the same metric.
pub fn velocity_window(
    history: &[Transaction],
    as_of: DateTime<Utc>,
    window_hours: i64,
) -> (usize, f64) {
    let cutoff = as_of - Duration::hours(window_hours);
    let recent: Vec<&Transaction> = history
        .iter()
        .filter(|t| t.timestamp >= cutoff && t.timestamp <= as_of)
        .collect();
    let total: f64 = recent.iter().map(|t| t.amount).sum();
    (recent.len(), total)
}

// ── Individual scorers ───────────────────────────────────────────────────────

/// Transaction count over the trailing year, capped-linear with
/// diminishing returns. Raw value: the count.
fn frequency(history: &[Transaction], as_of: DateTime<Utc>) -> (f64, Score) {
    let cutoff = as_of - Duration::days(HISTORY_WINDOW_DAYS);
    let count = history.iter().filter(|t| t.timestamp >= cutoff).count();
    let score = match count {
        0 => 0.0,
        c if c < 10 => (c as f64 * 3.0).min(30.0),
        c if c < 50 => 30.0 + (c - 10) as f64 * 0.75,
        c if c < 100 => 60.0 + (c - 50) as f64 * 0.6,
        c if c < 200 => 90.0 + (c - 100) as f64 * 0.1,
        _ => 100.0,
    };
    (count as f64, round2(score))
}

/// Share of deal-redeemed transactions. The 50-85% band is the sweet
/// spot; above it looks like deal-only behavior and is penalized.
fn redemption(history: &[Transaction]) -> (f64, Score) {
    if history.is_empty() {
        return (0.0, 0.0);
    }
    let redeemed = history
        .iter()
        .filter(|t| t.status == TxnStatus::Redeemed)
        .count();
    let rate = redeemed as f64 / history.len() as f64;
    let score = if rate < 0.10 {
        20.0
    } else if rate < 0.30 {
        40.0
    } else if rate < 0.50 {
        60.0
    } else if rate <= 0.85 {
        85.0 + (rate - 0.5) * 42.86
    } else {
        75.0
    };
    (round2(rate), round2(score.min(100.0)))
}

/// Distinct purchase categories. Raw value: the distinct count.
fn diversification(history: &[Transaction]) -> (f64, Score) {
    if history.is_empty() {
        return (0.0, 0.0);
    }
    let unique = history
        .iter()
        .map(|t| t.category.as_str())
        .collect::<HashSet<_>>()
        .len();
    let score = match unique {
        1 => 20.0,
        2..=3 => 40.0,
        4..=5 => 60.0,
        6..=8 => 80.0,
        _ => 100.0,
    };
    (unique as f64, score)
}

/// Spend trajectory: recent half-window vs earlier half-window of the
/// trailing year. An empty earlier window leaves the base score alone
/// (neutral trend) instead of dividing by zero. Raw value: growth rate.
fn growth(history: &[Transaction], as_of: DateTime<Utc>) -> (f64, Score) {
    if history.is_empty() {
        return (0.0, 0.0);
    }
    let window_start = as_of - Duration::days(HISTORY_WINDOW_DAYS);
    let split = as_of - Duration::days(GROWTH_SPLIT_DAYS);

    let earlier: f64 = history
        .iter()
        .filter(|t| t.timestamp >= window_start && t.timestamp < split)
        .map(|t| t.amount)
        .sum();
    let recent: f64 = history
        .iter()
        .filter(|t| t.timestamp >= split)
        .map(|t| t.amount)
        .sum();

    let total = earlier + recent;
    let mut score: f64 = if total < 1_000.0 {
        15.0
    } else if total < 5_000.0 {
        30.0
    } else if total < 20_000.0 {
        50.0
    } else if total < 50_000.0 {
        70.0
    } else {
        85.0
    };

    let mut rate = 0.0;
    if earlier > 0.0 {
        rate = (recent - earlier) / earlier;
        if rate > 0.3 {
            score += 15.0;
        } else if rate > 0.0 {
            score += 8.0;
        } else if rate < -0.3 {
            score -= 10.0;
        }
    }

    (round2(rate), round2(score.clamp(0.0, 100.0)))
}

/// Return ratio, inversely scored with a floor of 20. An empty history
/// is neutral, not punished. Raw value: the ratio.
fn returns(history: &[Transaction]) -> (f64, Score) {
    if history.is_empty() {
        return (0.0, NEUTRAL_RETURNS_SCORE);
    }
    let returned = history
        .iter()
        .filter(|t| t.status == TxnStatus::Returned)
        .count();
    let rate = returned as f64 / history.len() as f64;
    let score = if rate == 0.0 {
        100.0
    } else if rate < 0.02 {
        90.0
    } else if rate < 0.05 {
        75.0
    } else if rate < 0.10 {
        55.0
    } else if rate < 0.15 {
        35.0
    } else {
        20.0
    };
    (round2(rate), score)
}

/// Transactions in the trailing 24 hours. Moderate velocity is healthy;
/// extreme velocity drags the score down well before the fraud gate's
/// stricter ceilings fire. Raw value: the count.
fn velocity(history: &[Transaction], as_of: DateTime<Utc>) -> (f64, Score) {
    let (count, _) = velocity_window(history, as_of, VELOCITY_WINDOW_HOURS);
    let score = match count {
        0 => NEUTRAL_VELOCITY_SCORE,
        1..=2 => 90.0,
        3..=4 => 70.0,
        5..=8 => 40.0,
        _ => 10.0,
    };
    (count as f64, score)
}
