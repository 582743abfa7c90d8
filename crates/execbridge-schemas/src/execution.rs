use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::{ExecutionStatus, TradeType};

/// Column width limits enforced at validation time (see `execbridge-batch`).
pub mod widths {
    pub const EXECUTION_STATUS: usize = 20;
    pub const TRADE_TYPE: usize = 10;
    pub const DESTINATION: usize = 20;
    pub const SECURITY_ID: usize = 24;
}

/// The persisted `execution` row. Store-assigned `id`, monotonically
/// increasing `version`. Never constructed directly outside `execbridge-store`
/// except to describe a not-yet-inserted row (`id` absent, `version == 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub id: i64,
    pub execution_status: ExecutionStatus,
    pub trade_type: TradeType,
    pub destination: String,
    pub security_id: String,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub received_timestamp: DateTime<Utc>,
    pub sent_timestamp: Option<DateTime<Utc>>,
    pub trade_service_execution_id: Option<i64>,
    pub quantity_filled: Decimal,
    pub average_price: Option<Decimal>,
    pub version: i32,
}

/// Fields required to insert a new row; the store assigns `id`, forces
/// `version = 1`, and stamps `received_timestamp` if the caller left it unset.
#[derive(Debug, Clone)]
pub struct NewExecution {
    pub execution_status: ExecutionStatus,
    pub trade_type: TradeType,
    pub destination: String,
    pub security_id: String,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub received_timestamp: DateTime<Utc>,
    pub trade_service_execution_id: Option<i64>,
    pub quantity_filled: Decimal,
    pub average_price: Option<Decimal>,
}

/// Ephemeral, cache-only enrichment of a `securityId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub security_id: String,
    pub ticker: Option<String>,
}

/// Wire representation of an `Execution`: embeds the enriched `Security`
/// instead of a raw `securityId`, decimals as scale-8 strings, timestamps
/// ISO-8601 UTC with offset (via `chrono`'s default `DateTime<Utc>` encoding).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDto {
    pub id: i64,
    pub execution_status: ExecutionStatus,
    pub trade_type: TradeType,
    pub destination: String,
    pub security: Security,
    #[serde(with = "crate::decimal")]
    pub quantity: Decimal,
    #[serde(with = "crate::decimal::option")]
    pub limit_price: Option<Decimal>,
    pub received_timestamp: DateTime<Utc>,
    pub sent_timestamp: Option<DateTime<Utc>>,
    pub trade_service_execution_id: Option<i64>,
    #[serde(with = "crate::decimal")]
    pub quantity_filled: Decimal,
    #[serde(with = "crate::decimal::option")]
    pub average_price: Option<Decimal>,
    pub version: i32,
}

impl ExecutionDto {
    pub fn from_row(row: Execution, security: Security) -> Self {
        Self {
            id: row.id,
            execution_status: row.execution_status,
            trade_type: row.trade_type,
            destination: row.destination,
            security,
            quantity: row.quantity,
            limit_price: row.limit_price,
            received_timestamp: row.received_timestamp,
            sent_timestamp: row.sent_timestamp,
            trade_service_execution_id: row.trade_service_execution_id,
            quantity_filled: row.quantity_filled,
            average_price: row.average_price,
            version: row.version,
        }
    }
}

/// `POST /executions` (or one element of `POST /executions/batch`) body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExecutionRequest {
    pub execution_status: Option<String>,
    pub trade_type: Option<String>,
    pub destination: Option<String>,
    pub security_id: Option<String>,
    pub quantity: Option<String>,
    pub limit_price: Option<String>,
    pub trade_service_execution_id: Option<i64>,
}

/// `PUT /execution/{id}` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillUpdateRequest {
    #[serde(with = "crate::decimal")]
    pub quantity_filled: Decimal,
    #[serde(with = "crate::decimal::option", default)]
    pub average_price: Option<Decimal>,
    pub version: i32,
}
