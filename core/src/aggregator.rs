//! Score aggregation: weighted composite, risk tier, and credit limit.
//!
//! Deterministic by construction — identical breakdowns and requested
//! amounts produce identical output on every call.

use crate::{
    assessment::{Dimension, DimensionScore, RiskTier},
    config::LimitPolicy,
    types::{round2, Amount, Score},
};
use std::collections::BTreeMap;

/// Weighted sum of the normalized dimension scores.
pub fn composite_score(breakdown: &BTreeMap<Dimension, DimensionScore>) -> Score {
    let sum: f64 = breakdown
        .values()
        .map(|d| d.normalized_score * d.weight)
        .sum();
    round2(sum.clamp(0.0, 100.0))
}

pub fn risk_tier(score: Score, limits: &LimitPolicy) -> RiskTier {
    if score >= limits.low_risk_floor {
        RiskTier::Low
    } else if score >= limits.approval_threshold {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Map the composite score to a recommended credit limit.
///
/// Zero for the worst tier; otherwise linear in the score between
/// `min_limit` and `max_limit`, capped at the requested amount. The cap
/// means a recommendation never exceeds what the caller asked to finance.
pub fn recommended_limit(
    score: Score,
    requested_amount: Amount,
    limits: &LimitPolicy,
) -> Amount {
    if risk_tier(score, limits) == RiskTier::High {
        return 0.0;
    }
    let span = 100.0 - limits.approval_threshold;
    let ratio = ((score - limits.approval_threshold) / span).clamp(0.0, 1.0);
    let base = limits.min_limit + ratio * (limits.max_limit - limits.min_limit);
    round2(base.min(requested_amount))
}
