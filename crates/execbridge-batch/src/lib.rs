//! Bulk Processor + Error Recovery (C4 + C5): per-item validation,
//! deterministic batch splitting, and bulk-insert-with-fallback/classified
//! retry. Kept in one crate because C5 operates entirely in terms of C4's
//! `BatchProcessingContext`.

mod recovery;
mod split;
mod validation;

pub use recovery::{
    bulk_insert_with_fallback, spawn_recover_kafka_failures, NullRecoveryObserver, RecoveryObserver,
    RepublishSink, RowOutcome,
};
pub use split::split_into_batches;
pub use validation::{validate_batch, BatchProcessingContext};
