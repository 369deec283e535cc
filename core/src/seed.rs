//! Demo-data seeding: five user personas with characteristic histories.
//!
//! Mirrors the shapes the engine is designed to discriminate between: a
//! brand-new account (fraud-velocity reject), a thin single-category
//! history, a heavy deal redeemer, a steady mid-volume shopper, and a
//! high-volume diversified power user. Persona ids are fixed; transaction
//! content is generated deterministically from the master seed.

use crate::{
    error::AssessResult,
    rng::SeedRng,
    source::UserProfile,
    store::SqliteStore,
    transaction::{Channel, Transaction, TxnStatus},
    types::round2,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub struct PersonaSpec {
    pub user_id: &'static str,
    pub name: &'static str,
    pub risk_segment: &'static str,
    pub account_age_days: i64,
    pub txn_count: usize,
    pub categories: &'static [&'static str],
    pub amount_min: f64,
    pub amount_max: f64,
    pub redemption_rate: f64,
    pub return_rate: f64,
    pub spread_days: i64,
}

pub const PERSONAS: [PersonaSpec; 5] = [
    PersonaSpec {
        user_id: "11111111-1111-1111-1111-111111111111",
        name: "Rahul Verma",
        risk_segment: "new_user",
        account_age_days: 3,
        txn_count: 0,
        categories: &[],
        amount_min: 0.0,
        amount_max: 0.0,
        redemption_rate: 0.0,
        return_rate: 0.0,
        spread_days: 0,
    },
    PersonaSpec {
        user_id: "22222222-2222-2222-2222-222222222222",
        name: "Priya Sharma",
        risk_segment: "casual_shopper",
        account_age_days: 200,
        txn_count: 8,
        categories: &["Electronics"],
        amount_min: 200.0,
        amount_max: 1_500.0,
        redemption_rate: 0.25,
        return_rate: 0.0,
        spread_days: 180,
    },
    PersonaSpec {
        user_id: "33333333-3333-3333-3333-333333333333",
        name: "Amit Patel",
        risk_segment: "deal_hunter",
        account_age_days: 400,
        txn_count: 45,
        categories: &["Electronics", "Fashion", "Food & Dining", "Travel"],
        amount_min: 150.0,
        amount_max: 3_000.0,
        redemption_rate: 0.85,
        return_rate: 0.04,
        spread_days: 365,
    },
    PersonaSpec {
        user_id: "44444444-4444-4444-4444-444444444444",
        name: "Sneha Reddy",
        risk_segment: "regular_user",
        account_age_days: 600,
        txn_count: 90,
        categories: &[
            "Electronics",
            "Fashion",
            "Grocery",
            "Health",
            "Food & Dining",
            "Home",
        ],
        amount_min: 200.0,
        amount_max: 5_000.0,
        redemption_rate: 0.55,
        return_rate: 0.02,
        spread_days: 365,
    },
    PersonaSpec {
        user_id: "55555555-5555-5555-5555-555555555555",
        name: "Vikram Iyer",
        risk_segment: "power_user",
        account_age_days: 900,
        txn_count: 210,
        categories: &[
            "Electronics",
            "Fashion",
            "Grocery",
            "Health",
            "Food & Dining",
            "Home",
            "Travel",
            "Books",
            "Sports",
        ],
        amount_min: 500.0,
        amount_max: 8_000.0,
        redemption_rate: 0.55,
        return_rate: 0.02,
        spread_days: 330,
    },
];

const CHANNELS: [Channel; 4] = [Channel::Upi, Channel::Card, Channel::Wallet, Channel::Cod];

/// Seed all personas into the store. `now` anchors registration dates and
/// transaction timestamps so callers (and tests) control the time base.
pub fn seed_store(
    store: &SqliteStore,
    master_seed: u64,
    now: DateTime<Utc>,
) -> AssessResult<()> {
    for (index, persona) in PERSONAS.iter().enumerate() {
        let mut rng = SeedRng::new(master_seed, index as u64);

        let profile = UserProfile {
            user_id: persona.user_id.to_string(),
            name: persona.name.to_string(),
            registration_date: now - Duration::days(persona.account_age_days),
            risk_segment: persona.risk_segment.to_string(),
        };
        store.insert_user(&profile)?;

        for _ in 0..persona.txn_count {
            let minutes_back =
                rng.next_u64_below((persona.spread_days * 24 * 60).max(1) as u64) as i64;
            let status = if rng.chance(persona.return_rate) {
                TxnStatus::Returned
            } else if rng.chance(persona.redemption_rate) {
                TxnStatus::Redeemed
            } else {
                TxnStatus::Completed
            };
            let category =
                persona.categories[rng.next_u64_below(persona.categories.len() as u64) as usize];
            let channel = CHANNELS[rng.next_u64_below(CHANNELS.len() as u64) as usize];
            // Pareto-skewed amounts: many small purchases, a few large.
            let amount = round2(
                rng.pareto(persona.amount_min, 1.5).min(persona.amount_max),
            );

            store.insert_transaction(&Transaction {
                id: Uuid::new_v4().to_string(),
                user_id: persona.user_id.to_string(),
                timestamp: now - Duration::minutes(minutes_back),
                amount,
                category: category.to_string(),
                status,
                channel,
            })?;
        }

        log::debug!(
            "seeded persona {} ({}) with {} transactions",
            persona.name,
            persona.risk_segment,
            persona.txn_count
        );
    }
    Ok(())
}
