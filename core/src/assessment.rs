//! Assessment result types: dimension scores, composite assessments,
//! fraud check results, and denials.

use crate::emi::EmiOffer;
use crate::types::{Amount, Score, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six behavioral dimensions the engine scores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Frequency,
    Redemption,
    Diversification,
    Growth,
    Returns,
    Velocity,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Frequency,
        Dimension::Redemption,
        Dimension::Diversification,
        Dimension::Growth,
        Dimension::Returns,
        Dimension::Velocity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Redemption => "redemption",
            Self::Diversification => "diversification",
            Self::Growth => "growth",
            Self::Returns => "returns",
            Self::Velocity => "velocity",
        }
    }

    /// Human wording used by the narrative templates.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Frequency => "purchase frequency",
            Self::Redemption => "deal redemption",
            Self::Diversification => "category diversification",
            Self::Growth => "spend growth",
            Self::Returns => "return behavior",
            Self::Velocity => "transaction velocity",
        }
    }
}

/// One dimension's contribution to an assessment. Created fresh each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// The underlying metric before normalization (count, ratio, rate —
    /// depends on the dimension).
    pub raw_value: f64,
    pub normalized_score: Score,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// The full result of a non-denied assessment. Immutable after creation;
/// cached with the short assessment TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeAssessment {
    pub user_id: UserId,
    pub user_name: String,
    pub risk_segment: String,
    pub composite_score: Score,
    pub breakdown: BTreeMap<Dimension, DimensionScore>,
    pub recommended_limit: Amount,
    pub risk_tier: RiskTier,
    /// True when the recommended limit covers the full requested amount.
    pub approved: bool,
    pub narrative: Option<String>,
    pub emi_offers: Vec<EmiOffer>,
    pub fraud_flagged: bool,
    pub requested_amount: Amount,
    pub computed_at: DateTime<Utc>,
}

/// Outcome of the fraud-velocity gate. Recomputed per assessment and
/// never cached — it must reflect current velocity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCheckResult {
    pub user_id: UserId,
    pub flagged: bool,
    pub reason: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

/// Terminal outcome of a fraud-vetoed run. No score, no limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Denial {
    pub user_id: UserId,
    pub reason: String,
    pub evaluated_at: DateTime<Utc>,
}

/// The caller-visible result of `assess`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Assessment {
    Completed(CompositeAssessment),
    Denied(Denial),
}

impl Assessment {
    pub fn user_id(&self) -> &str {
        match self {
            Self::Completed(a) => &a.user_id,
            Self::Denied(d) => &d.user_id,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}
