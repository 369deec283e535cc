//! Assessment and narrative caching.
//!
//! RULE: The engine depends only on the CacheStore capability — get, set
//! with TTL, invalidate — never on a specific backing store. The typed
//! wrapper owns the key scheme and the TTL policy for the two regions:
//! short-lived assessments and long-lived narratives.

use crate::{
    assessment::Assessment,
    clock::Clock,
    config::CachePolicy,
    error::AssessResult,
    narrative::NarrativeCacheEntry,
    types::Amount,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str, ttl: Duration);
    fn invalidate(&self, key: &str);
}

struct Entry {
    value: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// In-process cache backend. Expiry is evaluated lazily on read against
/// the injected clock; concurrent writers to the same key settle on
/// last-writer-wins, which is safe because assessment writes are
/// idempotent for identical inputs.
pub struct InMemoryCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        let expires_at =
            self.clock.now() + chrono::Duration::milliseconds(ttl.as_millis() as i64);
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// Typed facade over the store: key scheme, bucketing, and TTLs.
pub struct AssessmentCache {
    store: Arc<dyn CacheStore>,
    policy: CachePolicy,
}

impl AssessmentCache {
    pub fn new(store: Arc<dyn CacheStore>, policy: CachePolicy) -> Self {
        Self { store, policy }
    }

    /// Bucket the requested amount so near-identical requests share a
    /// cache entry while materially different amounts do not.
    pub fn amount_bucket(&self, amount: Amount) -> u64 {
        (amount / self.policy.amount_bucket_size).ceil() as u64
    }

    fn assessment_key(&self, user_id: &str, amount: Amount) -> String {
        format!("assessment:{user_id}:{}", self.amount_bucket(amount))
    }

    fn latest_key(user_id: &str) -> String {
        format!("assessment:latest:{user_id}")
    }

    fn narrative_key(user_id: &str) -> String {
        format!("narrative:{user_id}")
    }

    pub fn get_assessment(&self, user_id: &str, amount: Amount) -> Option<Assessment> {
        let raw = self.store.get(&self.assessment_key(user_id, amount))?;
        // A corrupt entry is treated as a miss, not an error.
        serde_json::from_str(&raw).ok()
    }

    /// Write-through for both the bucketed key and the per-user latest
    /// alias serving the quick-lookup path. Denials get the short TTL.
    pub fn put_assessment(
        &self,
        assessment: &Assessment,
        amount: Amount,
    ) -> AssessResult<()> {
        let ttl = if assessment.is_denied() {
            Duration::from_secs(self.policy.denial_ttl_secs)
        } else {
            Duration::from_secs(self.policy.assessment_ttl_secs)
        };
        let raw = serde_json::to_string(assessment)?;
        self.store
            .set(&self.assessment_key(assessment.user_id(), amount), &raw, ttl);
        self.store
            .set(&Self::latest_key(assessment.user_id()), &raw, ttl);
        Ok(())
    }

    pub fn latest_assessment(&self, user_id: &str) -> Option<Assessment> {
        let raw = self.store.get(&Self::latest_key(user_id))?;
        serde_json::from_str(&raw).ok()
    }

    pub fn invalidate_assessment(&self, user_id: &str, amount: Amount) {
        self.store.invalidate(&self.assessment_key(user_id, amount));
        self.store.invalidate(&Self::latest_key(user_id));
    }

    pub fn get_narrative(&self, user_id: &str) -> Option<NarrativeCacheEntry> {
        let raw = self.store.get(&Self::narrative_key(user_id))?;
        serde_json::from_str(&raw).ok()
    }

    pub fn put_narrative(&self, entry: &NarrativeCacheEntry) -> AssessResult<()> {
        let raw = serde_json::to_string(entry)?;
        self.store.set(
            &Self::narrative_key(&entry.user_id),
            &raw,
            Duration::from_secs(self.policy.narrative_ttl_secs),
        );
        Ok(())
    }
}
