use std::str::FromStr;

use execbridge_schemas::{Execution, ExecutionStatus, TradeType};
use sqlx::Row;

use crate::errors::StoreError;

/// Hand-mapped row decode (not `query_as!`): this workspace doesn't assume a
/// live database at build time, so compile-time-checked macros are out.
pub(crate) fn map_execution_row(row: &sqlx::postgres::PgRow) -> Result<Execution, StoreError> {
    let status_str: String = row
        .try_get("execution_status")
        .map_err(|e| StoreError::NonTransient(e.to_string()))?;
    let trade_type_str: String = row
        .try_get("trade_type")
        .map_err(|e| StoreError::NonTransient(e.to_string()))?;

    Ok(Execution {
        id: row.try_get("id").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        execution_status: ExecutionStatus::from_str(&status_str)
            .map_err(|e| StoreError::NonTransient(e.to_string()))?,
        trade_type: TradeType::from_str(&trade_type_str).map_err(|e| StoreError::NonTransient(e.to_string()))?,
        destination: row.try_get("destination").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        security_id: row.try_get("security_id").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        quantity: row.try_get("quantity").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        limit_price: row.try_get("limit_price").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        received_timestamp: row
            .try_get("received_timestamp")
            .map_err(|e| StoreError::NonTransient(e.to_string()))?,
        sent_timestamp: row.try_get("sent_timestamp").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        trade_service_execution_id: row
            .try_get("trade_service_execution_id")
            .map_err(|e| StoreError::NonTransient(e.to_string()))?,
        quantity_filled: row
            .try_get("quantity_filled")
            .map_err(|e| StoreError::NonTransient(e.to_string()))?,
        average_price: row.try_get("average_price").map_err(|e| StoreError::NonTransient(e.to_string()))?,
        version: row.try_get("version").map_err(|e| StoreError::NonTransient(e.to_string()))?,
    })
}
