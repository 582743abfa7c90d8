//! Shared wire/domain types for the execution bridge.
//!
//! No I/O and no business logic beyond small pure helpers (status
//! derivation, enum parsing, sort/filter parsing) lives here — every other
//! crate depends on this one for a single, shared notion of an `Execution`.

pub mod batch;
pub mod decimal;
pub mod execution;
pub mod filter;
pub mod page;
pub mod sort;
pub mod status;

pub use batch::{BatchExecutionResponseDto, BatchStatus, ExecutionResultDto, ResultStatus, ValidationError, ValidationErrorCode};
pub use execution::{widths, Execution, ExecutionDto, FillUpdateRequest, NewExecution, NewExecutionRequest, Security};
pub use filter::FilterSpec;
pub use page::{PageEnvelope, Pagination};
pub use sort::{parse_sort_by, SortDirection, SortField, SortSpec};
pub use status::{derive_fill_status, ExecutionStatus, TradeType};
