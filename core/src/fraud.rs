//! Fraud-velocity gate.
//!
//! RULE: This is a hard gate, not advisory. It runs before scoring, its
//! result is never cached, and no path returns an eligible assessment
//! while it is flagged.

use crate::{
    assessment::FraudCheckResult,
    config::FraudPolicy,
    dimensions,
    source::UserProfile,
    transaction::Transaction,
};
use chrono::{DateTime, Utc};

/// Evaluate the velocity ceilings and the minimum-account-age rule.
///
/// The window metric is the same computation the velocity scorer uses;
/// the gate applies the stricter, security-oriented ceilings from config.
pub fn check(
    user_id: &str,
    profile: Option<&UserProfile>,
    history: &[Transaction],
    as_of: DateTime<Utc>,
    policy: &FraudPolicy,
) -> FraudCheckResult {
    if let Some(profile) = profile {
        let age_days = (as_of - profile.registration_date).num_days();
        if age_days < policy.min_account_age_days {
            return flagged(
                user_id,
                as_of,
                format!(
                    "Account age is only {age_days} day(s) — below the {}-day minimum",
                    policy.min_account_age_days
                ),
            );
        }
    }

    let (count, total) = dimensions::velocity_window(history, as_of, policy.window_hours);
    if count > policy.max_txn_count {
        return flagged(
            user_id,
            as_of,
            format!(
                "{count} transactions in the last {}h exceeds the ceiling of {}",
                policy.window_hours, policy.max_txn_count
            ),
        );
    }
    if total > policy.max_txn_amount {
        return flagged(
            user_id,
            as_of,
            format!(
                "₹{total:.0} transacted in the last {}h exceeds the ceiling of ₹{:.0}",
                policy.window_hours, policy.max_txn_amount
            ),
        );
    }

    FraudCheckResult {
        user_id: user_id.to_string(),
        flagged: false,
        reason: None,
        evaluated_at: as_of,
    }
}

fn flagged(user_id: &str, as_of: DateTime<Utc>, reason: String) -> FraudCheckResult {
    log::warn!("fraud velocity triggered for {user_id}: {reason}");
    FraudCheckResult {
        user_id: user_id.to_string(),
        flagged: true,
        reason: Some(reason),
        evaluated_at: as_of,
    }
}
