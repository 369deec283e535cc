//! Narrative blending: an external model with a deterministic fallback.
//!
//! RULE: The model is a collaborator, never a point of failure. Every
//! error path — disabled, timeout, transport failure, malformed payload —
//! degrades to the template narrative built from the score breakdown, and
//! the model's score adjustment can refine the deterministic composite by
//! at most the configured bound, never override it.

use crate::{
    assessment::{Dimension, DimensionScore},
    config::NarrativePolicy,
    transaction::{Transaction, TxnStatus},
    types::{round2, Amount, Score, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Version string recorded when the template fallback produced the text.
pub const TEMPLATE_MODEL_VERSION: &str = "template-v1";

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model call timed out after {0}ms")]
    Timeout(u64),

    #[error("model transport error: {0}")]
    Transport(String),

    #[error("model disabled")]
    Disabled,
}

/// Aggregate history facts cited by both the templates and model prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryFacts {
    pub transaction_count: usize,
    pub total_gmv: f64,
    pub redemption_rate: f64,
    pub return_rate: f64,
    pub category_count: usize,
}

impl HistoryFacts {
    pub fn from_history(history: &[Transaction]) -> Self {
        let n = history.len();
        let redeemed = history
            .iter()
            .filter(|t| t.status == TxnStatus::Redeemed)
            .count();
        let returned = history
            .iter()
            .filter(|t| t.status == TxnStatus::Returned)
            .count();
        let categories = history
            .iter()
            .map(|t| t.category.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();
        Self {
            transaction_count: n,
            total_gmv: round2(history.iter().map(|t| t.amount).sum()),
            redemption_rate: if n == 0 { 0.0 } else { redeemed as f64 / n as f64 },
            return_rate: if n == 0 { 0.0 } else { returned as f64 / n as f64 },
            category_count: categories,
        }
    }
}

/// Everything a model (or template) needs to explain a decision.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeRequest {
    pub user_name: String,
    pub composite_score: Score,
    pub approved: bool,
    pub recommended_limit: Amount,
    pub account_age_days: i64,
    pub facts: HistoryFacts,
    pub breakdown: BTreeMap<Dimension, DimensionScore>,
}

/// Strict shape the model's raw JSON payload must validate into.
/// Anything that does not parse to this is a collaborator failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPayload {
    pub narrative: String,
    #[serde(default)]
    pub score_adjustment: f64,
}

/// The external AI collaborator boundary.
pub trait NarrativeModel: Send + Sync {
    fn model_version(&self) -> String;

    /// Produce a raw JSON payload for the request. Implementations must
    /// honor the timeout and return `ModelError::Timeout` on expiry.
    fn generate(
        &self,
        request: &NarrativeRequest,
        timeout: Duration,
    ) -> Result<String, ModelError>;
}

/// A narrative as held in the long-TTL cache region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeCacheEntry {
    pub user_id: UserId,
    pub narrative_text: String,
    pub model_version: String,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlendOutcome {
    pub narrative: String,
    pub blended_score: Score,
    pub model_version: String,
    /// True only for a fresh, validated model response — the caller
    /// caches exactly those.
    pub freshly_generated: bool,
}

/// Merge the deterministic composite with the model's output.
///
/// A cached narrative is reused verbatim with no score adjustment; a
/// fresh model response is validated and its adjustment clamped; any
/// failure falls back to the template.
pub fn blend(
    model: Option<&dyn NarrativeModel>,
    cached: Option<NarrativeCacheEntry>,
    request: &NarrativeRequest,
    policy: &NarrativePolicy,
) -> BlendOutcome {
    if let Some(entry) = cached {
        log::debug!("narrative cache hit, reusing {} text", entry.model_version);
        return BlendOutcome {
            narrative: entry.narrative_text,
            blended_score: request.composite_score,
            model_version: entry.model_version,
            freshly_generated: false,
        };
    }

    let Some(model) = model else {
        return fallback(request);
    };

    let timeout = Duration::from_millis(policy.model_timeout_ms);
    match model.generate(request, timeout) {
        Ok(raw) => match parse_payload(&raw) {
            Ok(payload) if !payload.narrative.trim().is_empty() => {
                let adjustment = payload
                    .score_adjustment
                    .clamp(-policy.max_adjustment, policy.max_adjustment);
                BlendOutcome {
                    narrative: payload.narrative,
                    blended_score: round2(
                        (request.composite_score + adjustment).clamp(0.0, 100.0),
                    ),
                    model_version: model.model_version(),
                    freshly_generated: true,
                }
            }
            Ok(_) => {
                log::warn!("model returned an empty narrative, using template");
                fallback(request)
            }
            Err(e) => {
                log::warn!("model payload failed validation ({e}), using template");
                fallback(request)
            }
        },
        Err(e) => {
            log::warn!("narrative model failed ({e}), using template");
            fallback(request)
        }
    }
}

fn parse_payload(raw: &str) -> Result<ModelPayload, serde_json::Error> {
    serde_json::from_str(strip_fences(raw))
}

/// Models occasionally wrap JSON in markdown fences despite instructions.
fn strip_fences(raw: &str) -> &str {
    let t = raw.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    let t = t.strip_suffix("```").unwrap_or(t);
    t.trim()
}

// ── Template fallback ────────────────────────────────────────────────────────

fn fallback(request: &NarrativeRequest) -> BlendOutcome {
    let narrative = if request.approved {
        approval_narrative(request)
    } else {
        rejection_narrative(request)
    };
    BlendOutcome {
        narrative,
        blended_score: request.composite_score,
        model_version: TEMPLATE_MODEL_VERSION.to_string(),
        freshly_generated: false,
    }
}

fn score_of(request: &NarrativeRequest, dimension: Dimension) -> Score {
    request
        .breakdown
        .get(&dimension)
        .map(|d| d.normalized_score)
        .unwrap_or(0.0)
}

/// The breakdown entries with the highest and lowest normalized scores.
fn extremes(request: &NarrativeRequest) -> (Option<&DimensionScore>, Option<&DimensionScore>) {
    let strongest = request.breakdown.values().max_by(|a, b| {
        a.normalized_score
            .partial_cmp(&b.normalized_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let weakest = request.breakdown.values().min_by(|a, b| {
        a.normalized_score
            .partial_cmp(&b.normalized_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    (strongest, weakest)
}

fn approval_narrative(request: &NarrativeRequest) -> String {
    let facts = &request.facts;
    let mut strengths: Vec<String> = Vec::new();

    let frequency = score_of(request, Dimension::Frequency);
    if frequency >= 70.0 {
        strengths.push(format!(
            "made {} purchases, showing strong platform engagement",
            facts.transaction_count
        ));
    } else if frequency >= 40.0 {
        strengths.push(format!(
            "maintained consistent shopping activity with {} transactions",
            facts.transaction_count
        ));
    }

    if score_of(request, Dimension::Redemption) >= 70.0 {
        strengths.push(format!(
            "redeemed deals in {:.0}% of transactions, demonstrating smart deal usage",
            facts.redemption_rate * 100.0
        ));
    }

    let growth = score_of(request, Dimension::Growth);
    if growth >= 70.0 {
        strengths.push(format!(
            "shown a healthy spending trajectory with ₹{:.0} total spend",
            facts.total_gmv
        ));
    } else if growth >= 40.0 {
        strengths.push(format!(
            "demonstrated consistent spending with ₹{:.0} total spend",
            facts.total_gmv
        ));
    }

    if score_of(request, Dimension::Diversification) >= 60.0 {
        strengths.push(format!(
            "shopped across {} different categories",
            facts.category_count
        ));
    }

    if score_of(request, Dimension::Returns) >= 80.0 {
        let rate_text = if facts.return_rate > 0.0 {
            format!("only {:.1}%", facts.return_rate * 100.0)
        } else {
            "no".to_string()
        };
        strengths.push(format!(
            "maintained {rate_text} returns, reflecting purchase reliability"
        ));
    }

    if strengths.is_empty() {
        strengths.push("met our baseline eligibility criteria".to_string());
    }
    let strength_text = strengths.join(". You've ");

    format!(
        "Great news, {}! You qualify for Buy Now, Pay Later with a credit score of \
         {:.0}/100 and a limit of ₹{:.0}. You've {}. Your {}-day account history \
         provides additional confidence. Choose your preferred EMI tenure to \
         complete your purchase.",
        request.user_name,
        request.composite_score,
        request.recommended_limit,
        strength_text,
        request.account_age_days,
    )
}

fn rejection_narrative(request: &NarrativeRequest) -> String {
    let facts = &request.facts;
    let mut reasons: Vec<String> = Vec::new();

    if facts.transaction_count < 10 {
        reasons.push(format!(
            "a limited purchase history of only {} transaction(s)",
            facts.transaction_count
        ));
    }
    if facts.total_gmv < 2_000.0 {
        reasons.push(format!(
            "a total spending of ₹{:.0}, which is below our threshold",
            facts.total_gmv
        ));
    }
    if facts.return_rate > 0.10 {
        reasons.push(format!(
            "a return rate of {:.0}%, indicating higher-than-average returns",
            facts.return_rate * 100.0
        ));
    }
    if request.account_age_days < 30 {
        reasons.push(format!(
            "a relatively new account ({} days)",
            request.account_age_days
        ));
    }
    if reasons.is_empty() {
        reasons.push(
            "your overall credit signals not meeting our minimum criteria at this time"
                .to_string(),
        );
    }

    let reason_text = if reasons.len() > 1 {
        format!(
            "{}, and {}",
            reasons[..reasons.len() - 1].join(", "),
            reasons[reasons.len() - 1]
        )
    } else {
        reasons[0].clone()
    };

    let (strongest, weakest) = extremes(request);
    let signal_text = match (strongest, weakest) {
        (Some(s), Some(w)) if s.dimension != w.dimension => format!(
            " Your score was driven primarily by {}; the weakest signal was {}.",
            s.dimension.label(),
            w.dimension.label()
        ),
        _ => String::new(),
    };

    format!(
        "Hi {}, we were unable to approve your BNPL request at this time \
         (score: {:.0}/100). This is due to {}.{} We recommend continuing to \
         shop to build a stronger purchase history. Your eligibility will be \
         re-evaluated automatically on your next checkout.",
        request.user_name, request.composite_score, reason_text, signal_text,
    )
}
