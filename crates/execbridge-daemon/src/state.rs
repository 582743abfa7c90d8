//! Shared runtime state for execbridge-daemon.
//!
//! `AppState` holds the handles the HTTP layer needs directly (the store,
//! for paginated reads, and the enricher, for the `ticker` reverse lookup in
//! `GET /executions`) alongside the `ExecutionPipeline`, which owns its own
//! clones of both plus the publisher and trade-service client (§9, "no
//! hidden ambient state" — everything here was constructed once in `main`
//! and handed down by reference).

use std::sync::Arc;

use execbridge_config::BridgeConfig;
use execbridge_enrich::{HttpSecurityTransport, SecurityEnricher};
use execbridge_pipeline::ExecutionPipeline;
use execbridge_publish::KafkaTransport;
use execbridge_store::PgExecutionStore;
use execbridge_tradeclient::HttpTradeServiceClient;

/// The production instantiation of the pipeline: real Kafka, real outbound
/// HTTP to the security and trade services. Tests substitute fakes for
/// these type parameters directly against `ExecutionPipeline`, not through
/// `AppState` (see `execbridge-daemon/tests/`).
pub type AppPipeline = ExecutionPipeline<KafkaTransport, HttpSecurityTransport, HttpTradeServiceClient>;

pub struct AppState {
    pub store: Arc<PgExecutionStore>,
    pub enricher: Arc<SecurityEnricher<HttpSecurityTransport>>,
    pub pipeline: Arc<AppPipeline>,
    pub config: BridgeConfig,
}

impl AppState {
    pub fn new(
        store: Arc<PgExecutionStore>,
        enricher: Arc<SecurityEnricher<HttpSecurityTransport>>,
        pipeline: Arc<AppPipeline>,
        config: BridgeConfig,
    ) -> Self {
        Self { store, enricher, pipeline, config }
    }
}
