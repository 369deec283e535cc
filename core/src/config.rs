//! Engine configuration: scoring weights, decision thresholds, fraud
//! ceilings, cache TTLs, and EMI terms.
//!
//! Defaults below are the documented production constants. `load()` reads
//! a single JSON file whose fields override the defaults section by
//! section; in tests, use `EngineConfig::default()`.

use crate::assessment::Dimension;
use serde::{Deserialize, Serialize};

/// Per-dimension weights for the composite score. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub frequency: f64,
    pub redemption: f64,
    pub diversification: f64,
    pub growth: f64,
    pub returns: f64,
    pub velocity: f64,
}

impl DimensionWeights {
    pub fn for_dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Frequency => self.frequency,
            Dimension::Redemption => self.redemption,
            Dimension::Diversification => self.diversification,
            Dimension::Growth => self.growth,
            Dimension::Returns => self.returns,
            Dimension::Velocity => self.velocity,
        }
    }

    pub fn sum(&self) -> f64 {
        self.frequency
            + self.redemption
            + self.diversification
            + self.growth
            + self.returns
            + self.velocity
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            frequency: 0.20,
            redemption: 0.15,
            diversification: 0.15,
            growth: 0.25,
            returns: 0.15,
            velocity: 0.10,
        }
    }
}

/// Approval threshold, tier breakpoints, and the credit-limit band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitPolicy {
    /// Minimum composite score for any positive limit. Scores below this
    /// land in the worst tier and get a zero limit.
    pub approval_threshold: f64,
    /// Scores at or above this are the low-risk tier.
    pub low_risk_floor: f64,
    pub min_limit: f64,
    pub max_limit: f64,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            approval_threshold: 45.0,
            low_risk_floor: 70.0,
            min_limit: 2_000.0,
            max_limit: 50_000.0,
        }
    }
}

/// Fraud-gate ceilings. Stricter than the velocity scorer's thresholds:
/// the gate fires only on extreme velocity, not merely unhealthy levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudPolicy {
    pub window_hours: i64,
    pub max_txn_count: usize,
    pub max_txn_amount: f64,
    pub min_account_age_days: i64,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            window_hours: 24,
            max_txn_count: 15,
            max_txn_amount: 100_000.0,
            min_account_age_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePolicy {
    pub assessment_ttl_secs: u64,
    pub narrative_ttl_secs: u64,
    /// Denials are cached briefly to damp repeat fraud-recompute storms.
    pub denial_ttl_secs: u64,
    /// Requested amounts are bucketed to this granularity for cache keys.
    pub amount_bucket_size: f64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            assessment_ttl_secs: 300,
            narrative_ttl_secs: 86_400,
            denial_ttl_secs: 60,
            amount_bucket_size: 1_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativePolicy {
    /// The model's score adjustment is clamped to +/- this many points.
    pub max_adjustment: f64,
    pub model_timeout_ms: u64,
}

impl Default for NarrativePolicy {
    fn default() -> Self {
        Self {
            max_adjustment: 10.0,
            model_timeout_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiTenure {
    pub months: u32,
    pub annual_rate_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiPolicy {
    pub tenures: Vec<EmiTenure>,
    /// One-time fee charged on interest-bearing tenures, as a fraction of
    /// the principal.
    pub processing_fee_rate: f64,
}

impl Default for EmiPolicy {
    fn default() -> Self {
        Self {
            tenures: vec![
                EmiTenure { months: 3, annual_rate_pct: 0.0 },
                EmiTenure { months: 6, annual_rate_pct: 2.5 },
                EmiTenure { months: 9, annual_rate_pct: 5.0 },
            ],
            processing_fee_rate: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: DimensionWeights,
    pub limits: LimitPolicy,
    pub fraud: FraudPolicy,
    pub cache: CachePolicy,
    pub narrative: NarrativePolicy,
    pub emi: EmiPolicy,
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            anyhow::bail!("dimension weights must sum to 1.0, got {sum}");
        }
        if self.limits.min_limit > self.limits.max_limit {
            anyhow::bail!("min_limit must not exceed max_limit");
        }
        if self.limits.approval_threshold >= self.limits.low_risk_floor {
            anyhow::bail!("approval_threshold must be below low_risk_floor");
        }
        if self.cache.amount_bucket_size <= 0.0 {
            anyhow::bail!("amount_bucket_size must be positive");
        }
        Ok(())
    }
}
