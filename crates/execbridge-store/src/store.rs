use async_trait::async_trait;
use execbridge_schemas::{Execution, ExecutionStatus, FilterSpec, NewExecution, SortSpec};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::errors::{classify_sqlx_error, StoreError};
use crate::query::{push_filter, push_order_by, EXECUTION_COLUMNS};
use crate::row::map_execution_row;
use crate::tx::ExecutionTx;

/// Mutation applied by `updateWithVersion`. The caller (C10) has already
/// derived the new `executionStatus` from the new `quantityFilled`; the
/// store itself performs no business-rule derivation.
#[derive(Debug, Clone)]
pub struct ExecutionMutation {
    pub execution_status: ExecutionStatus,
    pub quantity_filled: Decimal,
    pub average_price: Option<Decimal>,
}

/// Capability-scoped interface over persisted `Execution` rows (§4.1),
/// so the rest of the pipeline can substitute a fake in tests instead of
/// depending on a live Postgres instance.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn insert(&self, row: NewExecution) -> Result<Execution, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Execution>, StoreError>;

    /// `limit` is expected to already be clamped to `<= 100` and `offset >= 0`
    /// by the caller (the HTTP layer); the store does not re-validate.
    async fn find_paged(
        &self,
        filter: &FilterSpec,
        sort: &[SortSpec],
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Execution>, i64), StoreError>;

    async fn update_with_version(
        &self,
        id: i64,
        mutation: ExecutionMutation,
        expected_version: i32,
    ) -> Result<Execution, StoreError>;
}

/// Postgres-backed `ExecutionStore`.
pub struct PgExecutionStore {
    pool: PgPool,
}

impl PgExecutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction. The returned handle is the only way to reach
    /// `bulk_update_sent_timestamp` (see `tx.rs`).
    pub async fn begin(&self) -> Result<ExecutionTx<'_>, StoreError> {
        let tx = self.pool.begin().await.map_err(classify_sqlx_error)?;
        Ok(ExecutionTx { tx })
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn insert(&self, row: NewExecution) -> Result<Execution, StoreError> {
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
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        map_execution_row(&pg_row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Execution>, StoreError> {
        let query = format!("select {EXECUTION_COLUMNS} from execution where id = $1");
        let pg_row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        pg_row.as_ref().map(map_execution_row).transpose()
    }

    async fn find_paged(
        &self,
        filter: &FilterSpec,
        sort: &[SortSpec],
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Execution>, i64), StoreError> {
        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("select count(*) as n from execution");
        push_filter(&mut count_qb, filter);
        let count_row = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        let total: i64 = count_row.try_get("n").map_err(|e| StoreError::NonTransient(e.to_string()))?;

        let mut select_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("select {EXECUTION_COLUMNS} from execution"));
        push_filter(&mut select_qb, filter);
        push_order_by(&mut select_qb, sort);
        select_qb.push(" limit ").push_bind(limit).push(" offset ").push_bind(offset);

        let rows = select_qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;
        let executions = rows.iter().map(map_execution_row).collect::<Result<Vec<_>, _>>()?;
        Ok((executions, total))
    }

    async fn update_with_version(
        &self,
        id: i64,
        mutation: ExecutionMutation,
        expected_version: i32,
    ) -> Result<Execution, StoreError> {
        let query = format!(
            "update execution set execution_status = $1, quantity_filled = $2, average_price = $3, \
             version = version + 1 where id = $4 and version = $5 returning {EXECUTION_COLUMNS}"
        );
        let updated = sqlx::query(&query)
            .bind(mutation.execution_status.as_str())
            .bind(mutation.quantity_filled)
            .bind(mutation.average_price)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        match updated {
            Some(row) => map_execution_row(&row),
            None => {
                let existing = sqlx::query("select version from execution where id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify_sqlx_error)?;
                match existing {
                    None => Err(StoreError::NotFound),
                    Some(row) => {
                        let found: i32 = row.try_get("version").map_err(|e| StoreError::NonTransient(e.to_string()))?;
                        Err(StoreError::VersionConflict { expected: expected_version, found })
                    }
                }
            }
        }
    }
}
