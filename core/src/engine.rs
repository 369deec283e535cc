//! The assessment engine — end-to-end orchestration of one credit
//! assessment.
//!
//! PIPELINE (fixed order, documented, never reordered):
//!   START → FRAUD_CHECK → (DENIED | SCORING) → NARRATIVE → CACHE_WRITE → DONE
//!
//! RULES:
//!   - The fraud gate runs before any scoring; a flagged run is terminal
//!     and skips narrative and offers entirely.
//!   - At most one narrative-model call per run; every model failure
//!     degrades to the deterministic template.
//!   - Source failures degrade to an empty history (neutral scores); only
//!     request validation surfaces an error to the caller.
//!   - The cache is the only shared state; one write per completed run.

use crate::{
    aggregator,
    assessment::{Assessment, CompositeAssessment, Denial},
    cache::{AssessmentCache, CacheStore, InMemoryCache},
    clock::{Clock, SystemClock},
    config::EngineConfig,
    dimensions,
    emi::{EmiCalculator, OfferSource},
    error::{AssessError, AssessResult},
    fraud,
    narrative::{self, HistoryFacts, NarrativeCacheEntry, NarrativeModel, NarrativeRequest},
    source::TransactionSource,
    transaction::Transaction,
    types::Amount,
};
use std::sync::Arc;

pub struct AssessmentEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    source: Arc<dyn TransactionSource>,
    offers: Arc<dyn OfferSource>,
    model: Option<Arc<dyn NarrativeModel>>,
    cache: AssessmentCache,
}

impl AssessmentEngine {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn TransactionSource>,
        offers: Arc<dyn OfferSource>,
        model: Option<Arc<dyn NarrativeModel>>,
        cache_store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = AssessmentCache::new(cache_store, config.cache.clone());
        Self {
            config,
            clock,
            source,
            offers,
            model,
            cache,
        }
    }

    /// Default wiring: system clock, in-process cache, built-in EMI
    /// calculator, narrative model disabled.
    pub fn build(config: EngineConfig, source: Arc<dyn TransactionSource>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache_store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new(clock.clone()));
        let offers: Arc<dyn OfferSource> = Arc::new(EmiCalculator::new(config.emi.clone()));
        Self::new(config, source, offers, None, cache_store, clock)
    }

    pub fn with_model(mut self, model: Arc<dyn NarrativeModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Run the full assessment pipeline for one user and amount.
    pub fn assess(&self, user_id: &str, requested_amount: Amount) -> AssessResult<Assessment> {
        validate_request(user_id, requested_amount)?;

        if let Some(hit) = self.cache.get_assessment(user_id, requested_amount) {
            log::info!("cache hit: returning stored assessment for {user_id}");
            return Ok(hit);
        }

        let as_of = self.clock.now();

        let profile = match self.source.user_profile(user_id) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("profile lookup failed for {user_id}: {e}; proceeding without");
                None
            }
        };
        let history: Vec<Transaction> = match self.source.user_transactions(user_id) {
            Ok(h) => h,
            Err(e) => {
                log::warn!(
                    "transaction source unavailable for {user_id}: {e}; scoring neutral"
                );
                Vec::new()
            }
        };

        // Hard gate before anything expensive.
        let fraud_result =
            fraud::check(user_id, profile.as_ref(), &history, as_of, &self.config.fraud);
        if fraud_result.flagged {
            let denial = Assessment::Denied(Denial {
                user_id: user_id.to_string(),
                reason: fraud_result
                    .reason
                    .unwrap_or_else(|| "fraud velocity ceiling exceeded".to_string()),
                evaluated_at: fraud_result.evaluated_at,
            });
            self.cache.put_assessment(&denial, requested_amount)?;
            return Ok(denial);
        }

        let breakdown = dimensions::score_all(&history, as_of, &self.config.weights);
        let composite = aggregator::composite_score(&breakdown);
        let prelim_limit =
            aggregator::recommended_limit(composite, requested_amount, &self.config.limits);

        let (user_name, risk_segment, account_age_days) = match &profile {
            Some(p) => (
                p.name.clone(),
                p.risk_segment.clone(),
                (as_of - p.registration_date).num_days(),
            ),
            None => (user_id.to_string(), "unknown".to_string(), 0),
        };

        let request = NarrativeRequest {
            user_name: user_name.clone(),
            composite_score: composite,
            approved: prelim_limit >= requested_amount,
            recommended_limit: prelim_limit,
            account_age_days,
            facts: HistoryFacts::from_history(&history),
            breakdown: breakdown.clone(),
        };
        let cached_narrative = self.cache.get_narrative(user_id);
        let outcome = narrative::blend(
            self.model.as_deref(),
            cached_narrative,
            &request,
            &self.config.narrative,
        );
        if outcome.freshly_generated {
            self.cache.put_narrative(&NarrativeCacheEntry {
                user_id: user_id.to_string(),
                narrative_text: outcome.narrative.clone(),
                model_version: outcome.model_version.clone(),
                computed_at: as_of,
            })?;
        }

        // Tier and limit are re-derived from the blended score so the
        // response stays internally consistent.
        let composite_score = outcome.blended_score;
        let risk_tier = aggregator::risk_tier(composite_score, &self.config.limits);
        let recommended_limit =
            aggregator::recommended_limit(composite_score, requested_amount, &self.config.limits);
        let approved = recommended_limit >= requested_amount && recommended_limit > 0.0;

        let emi_offers = if approved {
            match self
                .offers
                .fetch_emi_offers(requested_amount, recommended_limit)
            {
                Ok(offers) => offers,
                Err(e) => {
                    log::warn!("offer source failed for {user_id}: {e}; omitting offers");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let assessment = Assessment::Completed(CompositeAssessment {
            user_id: user_id.to_string(),
            user_name,
            risk_segment,
            composite_score,
            breakdown,
            recommended_limit,
            risk_tier,
            approved,
            narrative: Some(outcome.narrative),
            emi_offers,
            fraud_flagged: false,
            requested_amount,
            computed_at: as_of,
        });
        self.cache.put_assessment(&assessment, requested_amount)?;

        log::info!(
            "assessment completed for {user_id}: score {composite_score}, \
             tier {}, limit {recommended_limit}",
            risk_tier.as_str()
        );
        Ok(assessment)
    }

    /// Quick lookup: the most recent cached assessment, if unexpired.
    /// Never triggers a fraud check or a recompute.
    pub fn cached_score(&self, user_id: &str) -> Option<Assessment> {
        self.cache.latest_assessment(user_id)
    }
}

fn validate_request(user_id: &str, requested_amount: Amount) -> AssessResult<()> {
    if user_id.trim().is_empty() {
        return Err(AssessError::Validation("user_id must not be empty".into()));
    }
    if !requested_amount.is_finite() || requested_amount <= 0.0 {
        return Err(AssessError::Validation(format!(
            "requested_amount must be positive, got {requested_amount}"
        )));
    }
    Ok(())
}
