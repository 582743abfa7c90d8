//! Bulk Processor (C4): per-item validation, defaulting, and the
//! `BatchProcessingContext` the rest of the pipeline threads through.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use execbridge_schemas::{widths, NewExecution, NewExecutionRequest, ValidationError, ValidationErrorCode};
use rust_decimal::Decimal;

/// The in-memory processing context for one batch request (§3, "Batch
/// processing context"): the original request vector, a parallel vector of
/// validated rows (`None` where invalid), and a map of per-index validation
/// errors. Database errors and persisted results are folded in by later
/// stages (`recovery.rs`, and ultimately the pipeline orchestrator).
#[derive(Debug, Default)]
pub struct BatchProcessingContext {
    pub validated: Vec<Option<NewExecution>>,
    pub validation_errors: HashMap<usize, ValidationError>,
    pub database_errors: HashMap<usize, String>,
    pub successful_database_indices: Vec<usize>,
}

impl BatchProcessingContext {
    pub fn len(&self) -> usize {
        self.validated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validated.is_empty()
    }

    /// Indices that passed validation — the universe `recovery.rs` and the
    /// pipeline operate over for the DB/publish stages.
    pub fn valid_indices(&self) -> Vec<usize> {
        self.validated
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_some().then_some(i))
            .collect()
    }
}

/// Validate every element of `requests` (§4.4). A `None` request (a null
/// entry in a JSON array) is `NULL_REQUEST`, bound to the `field` `"$"` since
/// there's no field to blame.
pub fn validate_batch(requests: Vec<Option<NewExecutionRequest>>) -> BatchProcessingContext {
    let mut ctx = BatchProcessingContext {
        validated: Vec::with_capacity(requests.len()),
        validation_errors: HashMap::new(),
        database_errors: HashMap::new(),
        successful_database_indices: Vec::new(),
    };

    for (index, request) in requests.into_iter().enumerate() {
        match request {
            None => {
                ctx.validation_errors.insert(index, ValidationError::new(ValidationErrorCode::NullRequest, "$"));
                ctx.validated.push(None);
            }
            Some(req) => match validate_one(req) {
                Ok(new_exec) => ctx.validated.push(Some(new_exec)),
                Err(err) => {
                    ctx.validation_errors.insert(index, err);
                    ctx.validated.push(None);
                }
            },
        }
    }

    ctx
}

fn validate_one(req: NewExecutionRequest) -> Result<NewExecution, ValidationError> {
    let execution_status = require_field(req.execution_status.as_deref(), "executionStatus")?;
    let trade_type = require_field(req.trade_type.as_deref(), "tradeType")?;
    let destination = require_field(req.destination.as_deref(), "destination")?;
    let security_id = require_field(req.security_id.as_deref(), "securityId")?;
    let quantity_raw = require_field(req.quantity.as_deref(), "quantity")?;

    too_long(&execution_status, widths::EXECUTION_STATUS, "executionStatus")?;
    too_long(&trade_type, widths::TRADE_TYPE, "tradeType")?;
    too_long(&destination, widths::DESTINATION, "destination")?;
    if security_id.len() != widths::SECURITY_ID {
        return Err(ValidationError::new(ValidationErrorCode::FieldTooLong, "securityId"));
    }

    let execution_status = execbridge_schemas::ExecutionStatus::from_str(&execution_status)
        .map_err(|_| ValidationError::new(ValidationErrorCode::InvalidEnumValue, "executionStatus"))?;
    let trade_type = execbridge_schemas::TradeType::from_str(&trade_type)
        .map_err(|_| ValidationError::new(ValidationErrorCode::InvalidEnumValue, "tradeType"))?;

    let quantity = Decimal::from_str(&quantity_raw)
        .map_err(|_| ValidationError::new(ValidationErrorCode::InvalidValue, "quantity"))?;
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::new(ValidationErrorCode::InvalidValue, "quantity"));
    }

    let limit_price = match req.limit_price.as_deref() {
        None => None,
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => {
            let d = Decimal::from_str(raw).map_err(|_| ValidationError::new(ValidationErrorCode::InvalidValue, "limitPrice"))?;
            if d <= Decimal::ZERO {
                return Err(ValidationError::new(ValidationErrorCode::InvalidValue, "limitPrice"));
            }
            Some(d)
        }
    };

    Ok(NewExecution {
        execution_status,
        trade_type,
        destination,
        security_id,
        quantity,
        limit_price,
        received_timestamp: Utc::now(),
        trade_service_execution_id: req.trade_service_execution_id,
        quantity_filled: Decimal::ZERO,
        average_price: None,
    })
}

fn require_field(value: Option<&str>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::new(ValidationErrorCode::MissingRequiredField, field)),
    }
}

fn too_long(value: &str, max_width: usize, field: &'static str) -> Result<(), ValidationError> {
    if value.len() > max_width {
        Err(ValidationError::new(ValidationErrorCode::FieldTooLong, field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> NewExecutionRequest {
        NewExecutionRequest {
            execution_status: Some("NEW".to_string()),
            trade_type: Some("BUY".to_string()),
            destination: Some("NYSE".to_string()),
            security_id: Some("A".repeat(24)),
            quantity: Some("100.5".to_string()),
            limit_price: Some("10.25".to_string()),
            trade_service_execution_id: None,
        }
    }

    #[test]
    fn valid_request_produces_defaults() {
        let ctx = validate_batch(vec![Some(valid_request())]);
        assert!(ctx.validation_errors.is_empty());
        let row = ctx.validated[0].as_ref().unwrap();
        assert_eq!(row.quantity_filled, Decimal::ZERO);
        assert!(row.average_price.is_none());
    }

    #[test]
    fn missing_destination_is_missing_required_field() {
        let mut req = valid_request();
        req.destination = None;
        let ctx = validate_batch(vec![Some(req)]);
        let err = ctx.validation_errors.get(&0).unwrap();
        assert_eq!(err.code, ValidationErrorCode::MissingRequiredField);
        assert_eq!(err.field, "destination");
    }

    #[test]
    fn blank_destination_is_missing_required_field() {
        let mut req = valid_request();
        req.destination = Some("   ".to_string());
        let ctx = validate_batch(vec![Some(req)]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::MissingRequiredField);
    }

    #[test]
    fn oversized_destination_is_field_too_long() {
        let mut req = valid_request();
        req.destination = Some("X".repeat(21));
        let ctx = validate_batch(vec![Some(req)]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::FieldTooLong);
    }

    #[test]
    fn wrong_width_security_id_is_field_too_long() {
        let mut req = valid_request();
        req.security_id = Some("TOO_SHORT".to_string());
        let ctx = validate_batch(vec![Some(req)]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::FieldTooLong);
    }

    #[test]
    fn unknown_trade_type_is_invalid_enum() {
        let mut req = valid_request();
        req.trade_type = Some("SHORT".to_string());
        let ctx = validate_batch(vec![Some(req)]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::InvalidEnumValue);
    }

    #[test]
    fn zero_quantity_is_invalid_value() {
        let mut req = valid_request();
        req.quantity = Some("0".to_string());
        let ctx = validate_batch(vec![Some(req)]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::InvalidValue);
    }

    #[test]
    fn negative_limit_price_is_invalid_value() {
        let mut req = valid_request();
        req.limit_price = Some("-1".to_string());
        let ctx = validate_batch(vec![Some(req)]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::InvalidValue);
    }

    #[test]
    fn null_request_entry_is_null_request() {
        let ctx = validate_batch(vec![None, Some(valid_request())]);
        assert_eq!(ctx.validation_errors.get(&0).unwrap().code, ValidationErrorCode::NullRequest);
        assert!(ctx.validated[0].is_none());
        assert!(ctx.validated[1].is_some());
    }

    #[test]
    fn filled_synonym_accepted_as_full() {
        let mut req = valid_request();
        req.execution_status = Some("FILLED".to_string());
        let ctx = validate_batch(vec![Some(req)]);
        assert!(ctx.validation_errors.is_empty());
        assert_eq!(ctx.validated[0].as_ref().unwrap().execution_status, execbridge_schemas::ExecutionStatus::Full);
    }
}
