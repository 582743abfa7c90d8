//! Single-Update Path (C10): `PUT /execution/{id}` applies a fill as a
//! replacement (not an increment), commits it optimistically, and fires a
//! best-effort sync back to the upstream trade service.

use execbridge_enrich::SecurityTransport;
use execbridge_publish::PublishTransport;
use execbridge_schemas::{derive_fill_status, Execution, ExecutionDto, FillUpdateRequest};
use execbridge_store::{ExecutionMutation, ExecutionStore, StoreError};
use execbridge_tradeclient::{FillUpdate, TradeServiceClient};

use crate::batch::ExecutionPipeline;

/// Outcomes the HTTP layer maps onto 404/409/500 (§4.10).
#[derive(Debug)]
pub enum FillError {
    NotFound,
    VersionConflict,
    Internal(String),
}

impl<Pub, Sec, Trade> ExecutionPipeline<Pub, Sec, Trade>
where
    Pub: PublishTransport + 'static,
    Sec: SecurityTransport + 'static,
    Trade: TradeServiceClient + 'static,
{
    /// `PUT /execution/{id}` (§4.10). `request.version` is the optimistic
    /// concurrency token the caller last observed; a mismatch against the
    /// stored row returns `FillError::VersionConflict` without mutating
    /// anything.
    pub async fn apply_fill(&self, id: i64, request: FillUpdateRequest) -> Result<ExecutionDto, FillError> {
        let existing = self
            .store
            .find_by_id(id)
            .await
            .map_err(|err| FillError::Internal(err.to_string()))?
            .ok_or(FillError::NotFound)?;

        let execution_status = derive_fill_status(existing.quantity, request.quantity_filled);
        let mutation = ExecutionMutation {
            execution_status,
            quantity_filled: request.quantity_filled,
            average_price: request.average_price,
        };

        let updated = self.store.update_with_version(id, mutation, request.version).await.map_err(|err| match err {
            StoreError::VersionConflict { .. } => FillError::VersionConflict,
            StoreError::NotFound => FillError::NotFound,
            other => FillError::Internal(other.to_string()),
        })?;

        if let Some(trade_service_execution_id) = updated.trade_service_execution_id {
            self.spawn_trade_service_sync(trade_service_execution_id, &updated);
        }

        let security = self.enricher.enrich(&updated.security_id).await;
        Ok(ExecutionDto::from_row(updated, security))
    }

    /// §4.10 step 3: fire-and-forget `getExecutionVersion` then
    /// `updateExecutionFill`. The version threaded through is the upstream
    /// trade service's own version counter, not this row's local `version`
    /// — they're independent optimistic-concurrency tokens. Errors from C3
    /// never surface here — `TradeServiceClient`'s contract already
    /// swallows them (§4.3); this just keeps them off the request's
    /// critical path.
    fn spawn_trade_service_sync(&self, external_id: i64, updated: &Execution) {
        let trade_client = self.trade_client.clone();
        let execution_status = updated.execution_status;
        let quantity_filled = updated.quantity_filled;

        tokio::spawn(async move {
            let Some(version) = trade_client.get_execution_version(external_id).await else {
                tracing::debug!(external_id, "trade service has no version for this execution, skipping fill sync");
                return;
            };
            let fill = FillUpdate { execution_status, quantity_filled, version };
            let ok = trade_client.update_execution_fill(external_id, fill).await;
            if !ok {
                tracing::warn!(external_id, "trade service fill sync did not succeed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    //! `apply_fill` needs a live Postgres row for `find_by_id` /
    //! `update_with_version` (the optimistic-concurrency path can't be
    //! faked without the real `version` predicate in the `UPDATE`
    //! statement) — covered by the DB-gated scenario tests under
    //! `execbridge-daemon/tests/`.
    use super::*;

    #[test]
    fn fill_error_variants_are_debuggable() {
        assert_eq!(format!("{:?}", FillError::NotFound), "NotFound");
        assert_eq!(format!("{:?}", FillError::VersionConflict), "VersionConflict");
    }
}
