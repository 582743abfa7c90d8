//! Enum domains for `executionStatus` and `tradeType`.
//!
//! `executionStatus` is fixed to the six values below. `FILLED` is accepted
//! on ingress as a synonym of `FULL` (legacy callers still send it) but is
//! never produced by `Display`/serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    New,
    Pending,
    Part,
    Full,
    Cancelled,
    Rejected,
}

impl ExecutionStatus {
    pub const ALL: [ExecutionStatus; 6] = [
        ExecutionStatus::New,
        ExecutionStatus::Pending,
        ExecutionStatus::Part,
        ExecutionStatus::Full,
        ExecutionStatus::Cancelled,
        ExecutionStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::New => "NEW",
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Part => "PART",
            ExecutionStatus::Full => "FULL",
            ExecutionStatus::Cancelled => "CANCELLED",
            ExecutionStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownExecutionStatus(pub String);

impl fmt::Display for UnknownExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown executionStatus: {}", self.0)
    }
}

impl std::error::Error for UnknownExecutionStatus {}

impl FromStr for ExecutionStatus {
    type Err = UnknownExecutionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(ExecutionStatus::New),
            "PENDING" => Ok(ExecutionStatus::Pending),
            "PART" => Ok(ExecutionStatus::Part),
            // Ingress synonym — the source domain drifted between FILLED/FULL;
            // this is the one spot that reconciles it.
            "FULL" | "FILLED" => Ok(ExecutionStatus::Full),
            "CANCELLED" => Ok(ExecutionStatus::Cancelled),
            "REJECTED" => Ok(ExecutionStatus::Rejected),
            other => Err(UnknownExecutionStatus(other.to_string())),
        }
    }
}

impl Serialize for ExecutionStatus {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExecutionStatus {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        ExecutionStatus::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Derive the status implied by `quantityFilled` against `quantity`.
///
/// Only distinguishes `PART`/`FULL`; callers in terminal states
/// (`CANCELLED`/`REJECTED`) must not call this.
pub fn derive_fill_status(quantity: rust_decimal::Decimal, quantity_filled: rust_decimal::Decimal) -> ExecutionStatus {
    if quantity_filled >= quantity {
        ExecutionStatus::Full
    } else {
        ExecutionStatus::Part
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTradeType(pub String);

impl fmt::Display for UnknownTradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tradeType: {}", self.0)
    }
}

impl std::error::Error for UnknownTradeType {}

impl FromStr for TradeType {
    type Err = UnknownTradeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(TradeType::Buy),
            "SELL" => Ok(TradeType::Sell),
            other => Err(UnknownTradeType(other.to_string())),
        }
    }
}

impl Serialize for TradeType {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TradeType {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        TradeType::from_str(&s).map_err(serde::de::Error::custom)
    }
}
