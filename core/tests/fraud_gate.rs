//! Fraud gate tests: ceilings, account age, and the hard short-circuit.

use chrono::{DateTime, Duration, TimeZone, Utc};
use grabcredit_core::{
    assessment::Assessment,
    cache::InMemoryCache,
    clock::ManualClock,
    config::{EngineConfig, FraudPolicy},
    emi::EmiCalculator,
    engine::AssessmentEngine,
    error::AssessResult,
    fraud,
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

fn profile(account_age_days: i64) -> UserProfile {
    UserProfile {
        user_id: "u-1".into(),
        name: "Test User".into(),
        registration_date: base_time() - Duration::days(account_age_days),
        risk_segment: "regular_user".into(),
    }
}

fn txn_hours_ago(hours: i64, amount: f64) -> Transaction {
    Transaction {
        id: format!("t-h{hours}-{amount}"),
        user_id: "u-1".into(),
        timestamp: base_time() - Duration::hours(hours),
        amount,
        category: "Electronics".into(),
        status: TxnStatus::Completed,
        channel: Channel::Upi,
    }
}

fn txn_days_ago(days: i64, amount: f64) -> Transaction {
    Transaction {
        id: format!("t-d{days}-{amount}"),
        user_id: "u-1".into(),
        timestamp: base_time() - Duration::days(days),
        amount,
        category: "Grocery".into(),
        status: TxnStatus::Completed,
        channel: Channel::Card,
    }
}

fn engine_for(source: MemorySource) -> AssessmentEngine {
    let clock = Arc::new(ManualClock::new(base_time()));
    AssessmentEngine::new(
        EngineConfig::default(),
        Arc::new(source),
        Arc::new(EmiCalculator::new(EngineConfig::default().emi)),
        None,
        Arc::new(InMemoryCache::new(clock.clone())),
        clock,
    )
}

/// A burst over the count ceiling is denied even with an otherwise
/// excellent long history.
#[test]
fn count_ceiling_trips_gate() {
    let mut history: Vec<Transaction> =
        (0..100).map(|i| txn_days_ago(3 + i * 3, 1_200.0)).collect();
    history.extend((0..20).map(|i| txn_hours_ago(1 + (i % 12), 150.0)));

    let engine = engine_for(MemorySource {
        profile: Some(profile(600)),
        history,
    });
    let result = engine.assess("u-1", 5_000.0).unwrap();

    match result {
        Assessment::Denied(denial) => {
            assert!(
                denial.reason.contains("exceeds the ceiling"),
                "unexpected reason: {}",
                denial.reason
            );
        }
        Assessment::Completed(_) => panic!("burst velocity must deny"),
    }
}

#[test]
fn amount_ceiling_trips_gate() {
    let history = vec![
        txn_hours_ago(1, 50_000.0),
        txn_hours_ago(2, 50_000.0),
        txn_hours_ago(3, 50_000.0),
    ];
    let engine = engine_for(MemorySource {
        profile: Some(profile(600)),
        history,
    });

    let result = engine.assess("u-1", 5_000.0).unwrap();
    assert!(result.is_denied());
}

#[test]
fn young_account_denied() {
    let engine = engine_for(MemorySource {
        profile: Some(profile(3)),
        history: Vec::new(),
    });

    match engine.assess("u-1", 5_000.0).unwrap() {
        Assessment::Denied(denial) => {
            assert!(denial.reason.contains("Account age"), "{}", denial.reason);
        }
        Assessment::Completed(_) => panic!("3-day-old account must deny"),
    }
}

#[test]
fn clean_user_passes_gate() {
    let history: Vec<Transaction> = (0..30).map(|i| txn_days_ago(5 + i * 9, 900.0)).collect();
    let engine = engine_for(MemorySource {
        profile: Some(profile(400)),
        history,
    });

    match engine.assess("u-1", 5_000.0).unwrap() {
        Assessment::Completed(a) => assert!(!a.fraud_flagged),
        Assessment::Denied(d) => panic!("clean user denied: {}", d.reason),
    }
}

/// The denial is terminal: the cached quick-lookup result is the denial
/// itself, never a partially scored assessment.
#[test]
fn denial_is_terminal_and_cached() {
    let engine = engine_for(MemorySource {
        profile: Some(profile(2)),
        history: Vec::new(),
    });

    let first = engine.assess("u-1", 5_000.0).unwrap();
    assert!(first.is_denied());

    let cached = engine.cached_score("u-1").expect("denial should be cached");
    assert!(cached.is_denied());
}

// ── Direct gate checks ───────────────────────────────────────────────────────

#[test]
fn gate_boundary_is_exclusive() {
    let policy = FraudPolicy::default();

    // Exactly at the ceiling: allowed.
    let at_ceiling: Vec<Transaction> = (0..policy.max_txn_count)
        .map(|i| txn_hours_ago(1 + (i % 20) as i64, 100.0))
        .collect();
    let result = fraud::check(
        "u-1",
        Some(&profile(600)),
        &at_ceiling,
        base_time(),
        &policy,
    );
    assert!(!result.flagged);

    // One over: flagged, with a populated reason.
    let over: Vec<Transaction> = (0..policy.max_txn_count + 1)
        .map(|i| txn_hours_ago(1 + (i % 20) as i64, 100.0))
        .collect();
    let result = fraud::check("u-1", Some(&profile(600)), &over, base_time(), &policy);
    assert!(result.flagged);
    assert!(result.reason.is_some());
    assert_eq!(result.evaluated_at, base_time());
}

#[test]
fn unknown_profile_skips_age_rule() {
    let result = fraud::check(
        "ghost",
        None,
        &[],
        base_time(),
        &FraudPolicy::default(),
    );
    assert!(!result.flagged);
}
