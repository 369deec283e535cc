//! Shared primitive types used across the assessment engine.

/// A stable, unique identifier for a user.
pub type UserId = String;

/// A monetary amount in rupees.
pub type Amount = f64;

/// A normalized score in [0, 100].
pub type Score = f64;

/// Round to two decimal places, the precision every monetary amount and
/// score is reported at.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
