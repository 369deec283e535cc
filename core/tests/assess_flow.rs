//! End-to-end orchestration tests: validation, degradation, offers, and
//! the reference scenario.

use chrono::{DateTime, Duration, TimeZone, Utc};
use grabcredit_core::{
    assessment::{Assessment, RiskTier},
    cache::InMemoryCache,
    clock::ManualClock,
    config::EngineConfig,
    emi::EmiCalculator,
    engine::AssessmentEngine,
    error::{AssessError, AssessResult},
    source::{TransactionSource, UserProfile},
    transaction::{Channel, Transaction, TxnStatus},
};
use std::sync::Arc;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

struct MemorySource {
    profile: Option<UserProfile>,
    history: Vec<Transaction>,
}

impl TransactionSource for MemorySource {
    fn user_profile(&self, _user_id: &str) -> AssessResult<Option<UserProfile>> {
        Ok(self.profile.clone())
    }

    fn user_transactions(&self, _user_id: &str) -> AssessResult<Vec<Transaction>> {
        Ok(self.history.clone())
    }
}

/// A source that is down entirely.
struct BrokenSource;

impl TransactionSource for BrokenSource {
    fn user_profile(&self, _user_id: &str) -> AssessResult<Option<UserProfile>> {
        Err(AssessError::DataUnavailable("source offline".into()))
    }

    fn user_transactions(&self, _user_id: &str) -> AssessResult<Vec<Transaction>> {
        Err(AssessError::DataUnavailable("source offline".into()))
    }
}

fn engine_for(source: Arc<dyn TransactionSource>) -> AssessmentEngine {
    let clock = Arc::new(ManualClock::new(base_time()));
    AssessmentEngine::new(
        EngineConfig::default(),
        source,
        Arc::new(EmiCalculator::new(EngineConfig::default().emi)),
        None,
        Arc::new(InMemoryCache::new(clock.clone())),
        clock,
    )
}

fn txn(days_ago: i64, amount: f64, category: &str, status: TxnStatus) -> Transaction {
    Transaction {
        id: format!("t-{days_ago}-{category}"),
        user_id: "u-1".into(),
        timestamp: base_time() - Duration::days(days_ago),
        amount,
        category: category.into(),
        status,
        channel: Channel::Upi,
    }
}

/// The reference scenario: 10 completed transactions across 3 categories
/// over 30 days plus 2 redemptions and no returns, requesting 5000.
#[test]
fn reference_scenario_scores_medium_band() {
    let cats = ["Electronics", "Fashion", "Grocery"];
    let mut history: Vec<Transaction> = (0..10)
        .map(|i| txn(2 + (i * 3) % 28, 800.0, cats[(i % 3) as usize], TxnStatus::Completed))
        .collect();
    history.push(txn(9, 800.0, "Fashion", TxnStatus::Redeemed));
    history.push(txn(17, 800.0, "Grocery", TxnStatus::Redeemed));

    let engine = engine_for(Arc::new(MemorySource {
        profile: Some(UserProfile {
            user_id: "u-1".into(),
            name: "Sneha Reddy".into(),
            registration_date: base_time() - Duration::days(600),
            risk_segment: "regular_user".into(),
        }),
        history,
    }));

    match engine.assess("u-1", 5_000.0).unwrap() {
        Assessment::Completed(a) => {
            assert!(!a.fraud_flagged);
            assert_eq!(a.risk_tier, RiskTier::Medium);
            assert!(
                a.composite_score >= 45.0 && a.composite_score < 70.0,
                "expected a medium-high band score, got {}",
                a.composite_score
            );
            assert!(a.recommended_limit > 0.0);
            assert!(a.recommended_limit <= 5_000.0);
            assert!(a.approved);
            assert_eq!(a.emi_offers.len(), 3);
            assert!(a.narrative.is_some());
        }
        Assessment::Denied(d) => panic!("unexpected denial: {}", d.reason),
    }
}

/// Unknown users get a conservative assessment from the empty-history
/// fallbacks, never an error.
#[test]
fn unknown_user_gets_conservative_assessment() {
    let engine = engine_for(Arc::new(MemorySource {
        profile: None,
        history: Vec::new(),
    }));

    match engine.assess("ghost", 5_000.0).unwrap() {
        Assessment::Completed(a) => {
            // returns 50 * 0.15 + velocity 60 * 0.10
            assert_eq!(a.composite_score, 13.5);
            assert_eq!(a.risk_tier, RiskTier::High);
            assert_eq!(a.recommended_limit, 0.0);
            assert!(!a.approved);
            assert!(a.emi_offers.is_empty());
            assert!(!a.narrative.unwrap().trim().is_empty());
        }
        Assessment::Denied(d) => panic!("unknown user should not be denied: {}", d.reason),
    }
}

/// A dead data source degrades to the same conservative assessment.
#[test]
fn source_failure_degrades_gracefully() {
    let engine = engine_for(Arc::new(BrokenSource));

    match engine.assess("u-1", 5_000.0).unwrap() {
        Assessment::Completed(a) => {
            assert_eq!(a.composite_score, 13.5);
            assert_eq!(a.recommended_limit, 0.0);
        }
        Assessment::Denied(d) => panic!("degraded run should complete: {}", d.reason),
    }
}

/// Only validation failures are caller-visible errors.
#[test]
fn validation_rejects_malformed_requests() {
    let engine = engine_for(Arc::new(MemorySource {
        profile: None,
        history: Vec::new(),
    }));

    for (user, amount) in [
        ("", 5_000.0),
        ("   ", 5_000.0),
        ("u-1", 0.0),
        ("u-1", -20.0),
        ("u-1", f64::NAN),
        ("u-1", f64::INFINITY),
    ] {
        match engine.assess(user, amount) {
            Err(AssessError::Validation(_)) => {}
            other => panic!("expected validation error for ({user:?}, {amount}), got {other:?}"),
        }
    }
}

/// When the limit cannot cover the requested amount the response is not
/// approved and carries no offers, but still reports the partial limit.
#[test]
fn partial_limit_is_not_approved() {
    // A modest history whose limit base lands well below 50_000.
    let history: Vec<Transaction> = (0..12)
        .map(|i| txn(2 + i * 7, 900.0, "Electronics", TxnStatus::Completed))
        .collect();

    let engine = engine_for(Arc::new(MemorySource {
        profile: Some(UserProfile {
            user_id: "u-1".into(),
            name: "Priya Sharma".into(),
            registration_date: base_time() - Duration::days(300),
            risk_segment: "casual_shopper".into(),
        }),
        history,
    }));

    match engine.assess("u-1", 50_000.0).unwrap() {
        Assessment::Completed(a) => {
            assert!(a.recommended_limit > 0.0);
            assert!(a.recommended_limit < 50_000.0);
            assert!(!a.approved);
            assert!(a.emi_offers.is_empty());
        }
        Assessment::Denied(d) => panic!("unexpected denial: {}", d.reason),
    }
}

/// The quick lookup never computes: before any assess call it reports
/// not-yet-assessed.
#[test]
fn quick_lookup_does_not_trigger_assessment() {
    let engine = engine_for(Arc::new(MemorySource {
        profile: None,
        history: Vec::new(),
    }));

    assert!(engine.cached_score("u-1").is_none());
}
