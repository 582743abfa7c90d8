//! Batch-Size Optimizer and Pool/Metrics Monitor (C8/C9): the feedback
//! layer between the batch pipeline and the database connection pool.

mod metrics;
mod optimizer;
mod pool;

pub use metrics::{
    batch_processing_duration, batch_request_received, batch_request_succeeded, bulk_insert_duration,
    bulk_update_duration, database_operation, executions_processed, executions_succeeded,
    kafka_circuit_breaker_opened, kafka_publish_duration, kafka_publish_outcome, record_batch_summary,
};
pub use optimizer::{BatchObservation, BatchSizeOptimizer};
pub use pool::{record_gauges as record_pool_gauges, sample as sample_pool, PoolHealth};
