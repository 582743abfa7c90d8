use chrono::{DateTime, Utc};
use execbridge_schemas::{Execution, NewExecution};
use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::errors::{classify_sqlx_error, StoreError};
use crate::query::EXECUTION_COLUMNS;
use crate::row::map_execution_row;

/// A handle into an open transaction. This is the **only** way to reach
/// [`ExecutionTx::bulk_update_sent_timestamp`] — there is no pool-level
/// equivalent, so the transactional requirement from §9 can't be bypassed
/// by accident.
pub struct ExecutionTx<'c> {
    pub(crate) tx: Transaction<'c, Postgres>,
}

impl<'c> ExecutionTx<'c> {
    /// All-or-nothing multi-row insert. Failure raises a single error and
    /// leaves nothing committed; callers running this as part of the
    /// bulk-with-fallback flow (C5) are expected to catch the error and
    /// fall back to per-row inserts on a fresh transaction.
    ///
    /// Row order in the returned vector matches `rows` — PostgreSQL evaluates
    /// a plain multi-row `INSERT ... VALUES` in list order and `RETURNING`
    /// reflects that per-row evaluation order.
    pub async fn bulk_insert(&mut self, rows: &[NewExecution]) -> Result<Vec<Execution>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "insert into execution (execution_status, trade_type, destination, security_id, quantity, \
             limit_price, received_timestamp, trade_service_execution_id, quantity_filled, average_price, version) ",
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(row.execution_status.as_str())
                .push_bind(row.trade_type.as_str())
                .push_bind(&row.destination)
                .push_bind(&row.security_id)
                .push_bind(row.quantity)
                .push_bind(row.limit_price)
                .push_bind(row.received_timestamp)
                .push_bind(row.trade_service_execution_id)
                .push_bind(row.quantity_filled)
                .push_bind(row.average_price)
                .push_bind(1_i32);
        });
        qb.push(" returning ").push(EXECUTION_COLUMNS);

        let rows = qb
            .build()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(classify_sqlx_error)?;

        rows.iter().map(map_execution_row).collect()
    }

    /// Set `sentTimestamp = at` on every row in `ids`. Must run inside this
    /// transaction (enforced by construction, not by a runtime check) and
    /// commit together with whatever inserted those rows.
    pub async fn bulk_update_sent_timestamp(&mut self, ids: &[i64], at: DateTime<Utc>) -> Result<i64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("update execution set sent_timestamp = $1 where id = any($2) and sent_timestamp is null")
            .bind(at)
            .bind(ids)
            .execute(&mut *self.tx)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(result.rows_affected() as i64)
    }

    /// Single-row insert, used by the per-row fallback path (C5) once the
    /// bulk attempt has failed. Runs in the same transaction as the bulk
    /// attempt and the subsequent `bulk_update_sent_timestamp`, per the
    /// transaction discipline in §5.
    pub async fn insert_single(&mut self, row: &NewExecution) -> Result<Execution, StoreError> {
        let query = format!(
            "insert into execution (execution_status, trade_type, destination, security_id, quantity, \
             limit_price, received_timestamp, trade_service_execution_id, quantity_filled, average_price, version) \
             values ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,1) returning {EXECUTION_COLUMNS}"
        );
        let pg_row = sqlx::query(&query)
            .bind(row.execution_status.as_str())
            .bind(row.trade_type.as_str())
            .bind(&row.destination)
            .bind(&row.security_id)
            .bind(row.quantity)
            .bind(row.limit_price)
            .bind(row.received_timestamp)
            .bind(row.trade_service_execution_id)
            .bind(row.quantity_filled)
            .bind(row.average_price)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(classify_sqlx_error)?;
        map_execution_row(&pg_row)
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(classify_sqlx_error)
    }

    /// Roll back the transaction (critical-failure path).
    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(classify_sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    // `ExecutionTx` can only be constructed via `PgExecutionStore::begin`,
    // which requires a live pool — covered by the DB-gated scenario tests
    // in `tests/`, not here.
}
