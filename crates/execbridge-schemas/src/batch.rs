use serde::Serialize;

use crate::execution::ExecutionDto;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    MissingRequiredField,
    FieldTooLong,
    InvalidEnumValue,
    InvalidValue,
    NullRequest,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ValidationErrorCode::FieldTooLong => "FIELD_TOO_LONG",
            ValidationErrorCode::InvalidEnumValue => "INVALID_ENUM_VALUE",
            ValidationErrorCode::InvalidValue => "INVALID_VALUE",
            ValidationErrorCode::NullRequest => "NULL_REQUEST",
        }
    }
}

/// A single validation failure, attached to the request index it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: ValidationErrorCode,
    pub field: String,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, field: impl Into<String>) -> Self {
        Self { code, field: field.into() }
    }

    /// Matches the wire format from §4.7: `"Code: <code> Field: <field>"`.
    pub fn message(&self) -> String {
        format!("Code: {} Field: {}", self.code.as_str(), self.field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResultDto {
    pub request_index: usize,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecutionResultDto {
    pub fn success(request_index: usize, execution: ExecutionDto) -> Self {
        Self { request_index, status: ResultStatus::Success, execution: Some(execution), message: None }
    }

    pub fn failed(request_index: usize, message: impl Into<String>) -> Self {
        Self { request_index, status: ResultStatus::Failed, execution: None, message: Some(message.into()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl BatchStatus {
    /// Derive the aggregate status and matching HTTP code from the per-row mix.
    pub fn from_counts(total: usize, successful: usize) -> (BatchStatus, u16) {
        if total == 0 || successful == 0 {
            (BatchStatus::Failed, 400)
        } else if successful == total {
            (BatchStatus::Success, 201)
        } else {
            (BatchStatus::PartialSuccess, 207)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchExecutionResponseDto {
    pub status: BatchStatus,
    pub results: Vec<ExecutionResultDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message_format() {
        let e = ValidationError::new(ValidationErrorCode::MissingRequiredField, "destination");
        assert_eq!(e.message(), "Code: MISSING_REQUIRED_FIELD Field: destination");
    }

    #[test]
    fn batch_status_from_counts() {
        assert_eq!(BatchStatus::from_counts(3, 3).1, 201);
        assert_eq!(BatchStatus::from_counts(3, 1).1, 207);
        assert_eq!(BatchStatus::from_counts(3, 0).1, 400);
        assert_eq!(BatchStatus::from_counts(0, 0).1, 400);
    }
}
