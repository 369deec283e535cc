//! GrabCredit core — deterministic BNPL credit assessment.
//!
//! The engine computes a behavioral credit score from raw transaction
//! history across six dimensions, enforces a fraud-velocity gate before
//! any score is returned, blends in an optional model-generated narrative
//! with a deterministic template fallback, and caches results with
//! differentiated TTLs.

pub mod aggregator;
pub mod assessment;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dimensions;
pub mod emi;
pub mod engine;
pub mod error;
pub mod fraud;
pub mod narrative;
pub mod rng;
pub mod seed;
pub mod source;
pub mod store;
pub mod transaction;
pub mod types;
