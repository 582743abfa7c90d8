//! Pipeline metrics (C9): thin wrappers over the `metrics` crate's macros so
//! call sites read like the operation they're instrumenting rather than a
//! string literal.

use std::time::Duration;

pub fn batch_request_received() {
    metrics::counter!("batch.requests.total").increment(1);
}

pub fn batch_request_succeeded() {
    metrics::counter!("batch.requests.success").increment(1);
}

pub fn executions_processed(count: u64) {
    metrics::counter!("batch.executions.processed").increment(count);
}

pub fn executions_succeeded(count: u64) {
    metrics::counter!("batch.executions.success").increment(count);
}

pub fn database_operation(success: bool) {
    metrics::counter!("database.operations.total").increment(1);
    if !success {
        metrics::counter!("database.operations.error").increment(1);
    }
}

pub fn kafka_publish_outcome(success: bool, retried: bool) {
    if success {
        metrics::counter!("kafka.publish.success").increment(1);
    } else {
        metrics::counter!("kafka.publish.failure").increment(1);
    }
    if retried {
        metrics::counter!("kafka.publish.retry").increment(1);
    }
}

pub fn kafka_circuit_breaker_opened() {
    metrics::counter!("kafka.circuit.breaker.open").increment(1);
}

pub fn batch_processing_duration(elapsed: Duration) {
    metrics::histogram!("batch.processing.duration").record(elapsed.as_secs_f64());
}

pub fn bulk_insert_duration(elapsed: Duration) {
    metrics::histogram!("database.bulk.insert.duration").record(elapsed.as_secs_f64());
}

pub fn bulk_update_duration(elapsed: Duration) {
    metrics::histogram!("database.bulk.update.duration").record(elapsed.as_secs_f64());
}

pub fn kafka_publish_duration(elapsed: Duration) {
    metrics::histogram!("kafka.publish.duration").record(elapsed.as_secs_f64());
}

/// Derived throughput/latency/success-rate gauges for one finished batch
/// (§4.9, "Batch Throughput Gauges").
pub fn record_batch_summary(executions: u64, elapsed: Duration, successes: u64, optimal_batch_size: u32) {
    let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
    let throughput = executions as f64 / seconds;
    let success_rate = if executions == 0 { 1.0 } else { successes as f64 / executions as f64 };

    metrics::gauge!("batch.processing.throughput").set(throughput);
    metrics::gauge!("batch.processing.average.duration").set(elapsed.as_secs_f64());
    metrics::gauge!("batch.processing.success.rate").set(success_rate);
    metrics::gauge!("batch.size.optimal.current").set(optimal_batch_size as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_calls_do_not_panic_without_a_recorder_installed() {
        batch_request_received();
        batch_request_succeeded();
        executions_processed(10);
        executions_succeeded(9);
        database_operation(true);
        database_operation(false);
        kafka_publish_outcome(true, false);
        kafka_publish_outcome(false, true);
        kafka_circuit_breaker_opened();
        batch_processing_duration(Duration::from_millis(5));
        bulk_insert_duration(Duration::from_millis(5));
        bulk_update_duration(Duration::from_millis(5));
        kafka_publish_duration(Duration::from_millis(5));
        record_batch_summary(10, Duration::from_millis(100), 9, 500);
    }
}
