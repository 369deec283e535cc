//! EMI offer construction.
//!
//! The offer source is a collaborator boundary: the engine consumes it
//! only after a non-denied assessment, purely to enrich the response.
//! The built-in calculator is the deterministic default implementation.

use crate::{
    config::EmiPolicy,
    error::AssessResult,
    types::{round2, Amount},
};
use serde::{Deserialize, Serialize};

/// One EMI tenure option with its calculated monthly payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiOffer {
    pub tenure_months: u32,
    pub monthly_amount: f64,
    /// Annual interest rate in percent.
    pub interest_rate: f64,
    pub total_amount: f64,
    pub processing_fee: f64,
}

pub trait OfferSource: Send + Sync {
    /// Offers for the given purchase amount. Empty when the amount is not
    /// coverable by the credit limit.
    fn fetch_emi_offers(
        &self,
        amount: Amount,
        credit_limit: Amount,
    ) -> AssessResult<Vec<EmiOffer>>;
}

pub struct EmiCalculator {
    policy: EmiPolicy,
}

impl EmiCalculator {
    pub fn new(policy: EmiPolicy) -> Self {
        Self { policy }
    }
}

impl OfferSource for EmiCalculator {
    fn fetch_emi_offers(
        &self,
        amount: Amount,
        credit_limit: Amount,
    ) -> AssessResult<Vec<EmiOffer>> {
        if amount > credit_limit || amount <= 0.0 {
            return Ok(Vec::new());
        }

        let mut offers = Vec::with_capacity(self.policy.tenures.len());
        for tenure in &self.policy.tenures {
            let months = tenure.months;
            let monthly_rate = tenure.annual_rate_pct / 12.0 / 100.0;

            let (monthly_amount, total) = if monthly_rate == 0.0 {
                // No-cost EMI.
                (amount / months as f64, amount)
            } else {
                // Standard EMI formula: P * r * (1+r)^n / ((1+r)^n - 1)
                let factor = (1.0 + monthly_rate).powi(months as i32);
                let monthly = amount * monthly_rate * factor / (factor - 1.0);
                (monthly, monthly * months as f64)
            };

            let processing_fee = if tenure.annual_rate_pct > 0.0 {
                round2(amount * self.policy.processing_fee_rate)
            } else {
                0.0
            };

            offers.push(EmiOffer {
                tenure_months: months,
                monthly_amount: round2(monthly_amount),
                interest_rate: tenure.annual_rate_pct,
                total_amount: round2(total),
                processing_fee,
            });
        }

        Ok(offers)
    }
}
