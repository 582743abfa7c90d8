//! Error Recovery (C5): bulk-insert-with-fallback and classified retry of
//! single-row inserts, plus the best-effort background re-publish sweep for
//! executions whose persistence succeeded but whose initial publish did not.

use std::time::Duration;

use async_trait::async_trait;
use execbridge_config::DatabaseConfig;
use execbridge_schemas::{Execution, NewExecution};
use execbridge_store::{ExecutionTx, StoreError};

/// Observation hook invoked as C5 makes progress, so C9 can maintain its
/// counters without C5 depending on the metrics crate directly (§9, "giving
/// the optimizer and metrics-monitor read-only observation hooks").
pub trait RecoveryObserver: Send + Sync {
    fn on_bulk_insert_failed(&self) {}
    fn on_single_insert_success(&self) {}
    fn on_single_insert_failed(&self) {}
    fn on_single_insert_retry(&self) {}
}

/// No-op observer for call sites (tests, `recoverKafkaFailures`) that don't
/// care about metrics.
pub struct NullRecoveryObserver;
impl RecoveryObserver for NullRecoveryObserver {}

/// Outcome of attempting to persist one row of a batch.
pub enum RowOutcome {
    Inserted(Execution),
    Failed(String),
}

/// `bulkInsertWithFallback` (§4.5). `rows` are `(request_index, row)` pairs
/// from one chunk produced by `split_into_batches`. Returns the same pairing
/// applied to the outcome, so the caller can fold successes/failures back
/// into the original request index.
pub async fn bulk_insert_with_fallback(
    tx: &mut ExecutionTx<'_>,
    rows: &[(usize, NewExecution)],
    cfg: &DatabaseConfig,
    observer: &dyn RecoveryObserver,
) -> Vec<(usize, RowOutcome)> {
    if rows.is_empty() {
        return Vec::new();
    }

    let plain_rows: Vec<NewExecution> = rows.iter().map(|(_, r)| r.clone()).collect();
    match tx.bulk_insert(&plain_rows).await {
        Ok(inserted) => rows
            .iter()
            .zip(inserted)
            .map(|((idx, _), exec)| (*idx, RowOutcome::Inserted(exec)))
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, count = rows.len(), "bulk insert failed, falling back to per-row inserts");
            observer.on_bulk_insert_failed();

            let mut out = Vec::with_capacity(rows.len());
            for (idx, row) in rows {
                let outcome = insert_single_with_retry(tx, row, cfg, observer).await;
                match &outcome {
                    RowOutcome::Inserted(_) => observer.on_single_insert_success(),
                    RowOutcome::Failed(_) => observer.on_single_insert_failed(),
                }
                out.push((*idx, outcome));
            }
            out
        }
    }
}

/// Classified retry of one row (§4.5 step 3): transient errors (deadlock,
/// query timeout, generic transient data-access error) are retried up to
/// `maxRetries` with exponential backoff bounded by `maxRetryDelayMs`;
/// non-transient errors fail immediately with no retry.
async fn insert_single_with_retry(
    tx: &mut ExecutionTx<'_>,
    row: &NewExecution,
    cfg: &DatabaseConfig,
    observer: &dyn RecoveryObserver,
) -> RowOutcome {
    let mut delay = cfg.retry_delay;
    let mut attempt = 0;

    loop {
        match tx.insert_single(row).await {
            Ok(exec) => return RowOutcome::Inserted(exec),
            Err(err) => {
                if !err.is_transient() || attempt >= cfg.max_retries {
                    return RowOutcome::Failed(root_cause_summary(&err));
                }
                observer.on_single_insert_retry();
                attempt += 1;
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(cfg.max_retry_delay);
            }
        }
    }
}

fn root_cause_summary(err: &StoreError) -> String {
    err.to_string()
}

/// `recoverKafkaFailures` (§4.5): best-effort background retry for
/// executions whose DB write committed but whose initial publish attempt
/// did not go through. Callers spawn this and move on — it is not awaited
/// synchronously, matching the fire-and-forget contract in §5 ("publish is
/// fire-and-forget after persistence").
pub fn spawn_recover_kafka_failures<S>(failed_executions: Vec<Execution>, sink: S)
where
    S: RepublishSink + 'static,
{
    if failed_executions.is_empty() {
        return;
    }
    tokio::spawn(async move {
        for exec in failed_executions {
            let id = exec.id;
            if let Err(err) = sink.republish(exec).await {
                tracing::warn!(execution_id = id, error = %err, "background kafka recovery failed");
            }
        }
    });
}

/// Minimal republish capability `recoverKafkaFailures` needs from C6,
/// expressed as a trait here so `execbridge-batch` doesn't depend on
/// `execbridge-publish` — the pipeline crate wires the real publisher in.
#[async_trait]
pub trait RepublishSink: Send + Sync {
    async fn republish(&self, execution: Execution) -> anyhow::Result<()>;
}
