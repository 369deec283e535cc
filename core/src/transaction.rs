//! Transaction records as delivered by the transaction data source.
//!
//! RULE: The core never mutates a Transaction. Histories are read-only
//! views, ordered by timestamp, consumed by the dimension scorers.

use crate::types::{Amount, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnStatus {
    /// Regular purchase that settled normally.
    Completed,
    /// Purchase that was later returned.
    Returned,
    /// Purchase made through a deal/coupon redemption.
    Redeemed,
}

impl TxnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Returned => "returned",
            Self::Redeemed => "redeemed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Upi,
    Card,
    Wallet,
    Cod,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::Card => "card",
            Self::Wallet => "wallet",
            Self::Cod => "cod",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown value '{value}' for {kind}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for TxnStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "returned" => Ok(Self::Returned),
            "redeemed" => Ok(Self::Redeemed),
            other => Err(ParseEnumError {
                kind: "transaction status",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Channel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            "wallet" => Ok(Self::Wallet),
            "cod" => Ok(Self::Cod),
            other => Err(ParseEnumError {
                kind: "payment channel",
                value: other.to_string(),
            }),
        }
    }
}

/// One purchase record. Produced by the data source, never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub amount: Amount,
    pub category: String,
    pub status: TxnStatus,
    pub channel: Channel,
}
