//! DB-gated scenario tests for the parts of the pipeline that need a live
//! Postgres transaction — `process_chunk`'s bulk-insert-plus-sentTimestamp
//! transaction (`execbridge-store/src/tx.rs`) and `apply_fill`'s optimistic
//! `updateWithVersion` (`execbridge-store/src/store.rs`) — neither of which
//! can be exercised against a fake store. Kafka and the two outbound HTTP
//! dependencies (security catalog, trade service) ARE faked here: this file
//! is about the database transaction discipline and the fill-status state
//! machine, not the message bus or upstream services.
//!
//! Skips with a `SKIP:` message instead of failing when `EXECBRIDGE_DATABASE_URL`
//! is unset, mirroring the teacher's `mqk_db::ENV_DB_URL` convention.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use execbridge_config::{BatchConfig, DatabaseConfig};
use execbridge_enrich::{SecurityEnricher, SecurityTransport};
use execbridge_perf::BatchSizeOptimizer;
use execbridge_pipeline::{ExecutionPipeline, FillError};
use execbridge_publish::{AsyncPublisher, PublishTransport};
use execbridge_schemas::{ExecutionStatus, FillUpdateRequest, NewExecutionRequest};
use execbridge_store::PgExecutionStore;
use execbridge_tradeclient::{FillUpdate, TradeServiceClient};
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;

struct NoopPublishTransport;

#[async_trait]
impl PublishTransport for NoopPublishTransport {
    async fn send(&self, _topic: &str, _key: &str, _value: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

struct NoTickerSecurityTransport;

#[async_trait]
impl SecurityTransport for NoTickerSecurityTransport {
    async fn fetch_ticker(&self, _security_id: &str) -> Option<String> {
        None
    }
}

struct UnreachableTradeServiceClient;

#[async_trait]
impl TradeServiceClient for UnreachableTradeServiceClient {
    async fn get_execution_version(&self, _external_id: i64) -> Option<i32> {
        None
    }

    async fn update_execution_fill(&self, _external_id: i64, _fill: FillUpdate) -> bool {
        false
    }
}

type TestPipeline = ExecutionPipeline<NoopPublishTransport, NoTickerSecurityTransport, UnreachableTradeServiceClient>;

async fn connect_or_skip() -> Option<sqlx::PgPool> {
    let url = match std::env::var(execbridge_config::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: EXECBRIDGE_DATABASE_URL not set");
            return None;
        }
    };
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.expect("connect to test database");
    execbridge_store::migrate(&pool).await.expect("run execution migration");
    Some(pool)
}

fn test_pipeline(pool: sqlx::PgPool) -> TestPipeline {
    let store = Arc::new(PgExecutionStore::new(pool));
    let publisher = Arc::new(AsyncPublisher::new(
        NoopPublishTransport,
        execbridge_config::KafkaConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(100),
            enable_dead_letter_queue: false,
            bootstrap_servers: "unused".to_string(),
            topic: "orders".to_string(),
            dead_letter_topic: "orders.dlq".to_string(),
        },
        5,
        Duration::from_secs(60),
        true,
    ));
    let enricher = Arc::new(SecurityEnricher::new(NoTickerSecurityTransport, Duration::from_secs(300), 10_000));
    let trade_client = Arc::new(UnreachableTradeServiceClient);
    let optimizer = Arc::new(BatchSizeOptimizer::new(500, 50, 2_000, false, Duration::from_secs(5)));
    let database_cfg = DatabaseConfig {
        url: "unused".to_string(),
        max_pool_size: 20,
        connection_timeout: Duration::from_secs(30),
        max_lifetime: Duration::from_secs(1_800),
        max_retries: 3,
        retry_delay: Duration::from_millis(10),
        max_retry_delay: Duration::from_millis(100),
    };
    let batch_cfg = BatchConfig { bulk_insert_batch_size: 500, max_concurrent_batches: 10, enable_async_kafka: true };

    ExecutionPipeline::new(store, publisher, enricher, trade_client, optimizer, database_cfg, batch_cfg)
}

fn valid_request(destination: &str, security_id: &str, quantity: &str) -> NewExecutionRequest {
    NewExecutionRequest {
        execution_status: Some("NEW".to_string()),
        trade_type: Some("BUY".to_string()),
        destination: Some(destination.to_string()),
        security_id: Some(security_id.to_string()),
        quantity: Some(quantity.to_string()),
        limit_price: None,
        trade_service_execution_id: None,
    }
}

#[tokio::test]
async fn happy_batch_of_three_persists_and_stamps_sent_timestamp() -> anyhow::Result<()> {
    let Some(pool) = connect_or_skip().await else { return Ok(()) };
    let pipeline = test_pipeline(pool);

    let requests = vec![
        Some(valid_request("EXB-HAPPY", &"A".repeat(24), "10")),
        Some(valid_request("EXB-HAPPY", &"B".repeat(24), "20")),
        Some(valid_request("EXB-HAPPY", &"C".repeat(24), "30")),
    ];

    let (response, http_code) = pipeline.submit_batch(requests).await;
    assert_eq!(http_code, 201);
    assert_eq!(response.results.len(), 3);

    for result in &response.results {
        let execution = result.execution.as_ref().expect("successful row should carry its execution");
        assert!(execution.sent_timestamp.is_some(), "sentTimestamp must be set once the chunk commits");
        assert_eq!(execution.version, 1);
        assert_eq!(execution.execution_status, ExecutionStatus::New);
    }

    Ok(())
}

#[tokio::test]
async fn partial_batch_reports_per_index_success_and_failure() -> anyhow::Result<()> {
    let Some(pool) = connect_or_skip().await else { return Ok(()) };
    let pipeline = test_pipeline(pool);

    let mut missing_destination = valid_request("EXB-PARTIAL", &"D".repeat(24), "5");
    missing_destination.destination = None;

    let requests = vec![Some(valid_request("EXB-PARTIAL", &"E".repeat(24), "5")), Some(missing_destination)];

    let (response, http_code) = pipeline.submit_batch(requests).await;
    assert_eq!(http_code, 207);
    assert_eq!(response.results.len(), 2);

    assert!(response.results[0].execution.is_some());
    assert!(response.results[1].execution.is_none());
    assert!(response.results[1].message.as_deref().unwrap().contains("MISSING_REQUIRED_FIELD"));

    Ok(())
}

#[tokio::test]
async fn optimistic_put_conflicts_on_stale_version_and_derives_fill_status() -> anyhow::Result<()> {
    let Some(pool) = connect_or_skip().await else { return Ok(()) };
    let pipeline = test_pipeline(pool);

    let (created, http_code) = pipeline.submit_batch(vec![Some(valid_request("EXB-FILL", &"F".repeat(24), "10"))]).await;
    assert_eq!(http_code, 201);
    let execution = created.results[0].execution.clone().expect("row committed");
    assert_eq!(execution.version, 1);

    let partial_fill = FillUpdateRequest { quantity_filled: dec!(4), average_price: Some(dec!(10.5)), version: execution.version };
    let after_partial = pipeline.apply_fill(execution.id, partial_fill).await.expect("stale version matches the fresh row");
    assert_eq!(after_partial.execution_status, ExecutionStatus::Part);
    assert_eq!(after_partial.version, 2);

    let stale_retry = FillUpdateRequest { quantity_filled: dec!(4), average_price: Some(dec!(10.5)), version: 1 };
    let conflict = pipeline.apply_fill(execution.id, stale_retry).await;
    assert!(matches!(conflict, Err(FillError::VersionConflict)));

    let full_fill = FillUpdateRequest { quantity_filled: dec!(10), average_price: Some(dec!(10.75)), version: after_partial.version };
    let after_full = pipeline.apply_fill(execution.id, full_fill).await.expect("current version matches");
    assert_eq!(after_full.execution_status, ExecutionStatus::Full);
    assert_eq!(after_full.version, 3);

    let not_found = pipeline
        .apply_fill(i64::MAX - 1, FillUpdateRequest { quantity_filled: dec!(1), average_price: None, version: 1 })
        .await;
    assert!(matches!(not_found, Err(FillError::NotFound)));

    Ok(())
}
