//! Collaborator boundary: the transaction data source.
//!
//! RULE: Unknown users are a defined result (None profile, empty
//! history), never an error — the scorers' empty-history fallbacks apply.

use crate::{error::AssessResult, transaction::Transaction, types::UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    pub registration_date: DateTime<Utc>,
    pub risk_segment: String,
}

pub trait TransactionSource: Send + Sync {
    fn user_profile(&self, user_id: &str) -> AssessResult<Option<UserProfile>>;

    /// Full history for a user, ordered by timestamp ascending.
    fn user_transactions(&self, user_id: &str) -> AssessResult<Vec<Transaction>>;
}
