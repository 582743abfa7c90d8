//! Wire shapes for the outbound trade-service calls (§6).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use execbridge_schemas::ExecutionStatus;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TradeExecutionVersionResponse {
    #[allow(dead_code)]
    pub id: i64,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FillUpdateBody {
    pub execution_status: ExecutionStatus,
    #[serde(with = "execbridge_schemas::decimal")]
    pub quantity_filled: Decimal,
    pub version: i32,
}
