//! execbridge-daemon entry point.
//!
//! Thin by design: load config, connect/migrate the database, construct
//! every component (C1–C10) once, wire them into `AppState`, then start the
//! HTTP server. All route handlers live in `routes.rs`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use execbridge_config::BridgeConfig;
use execbridge_daemon::{routes, state::AppState};
use execbridge_enrich::{HttpSecurityTransport, SecurityEnricher};
use execbridge_perf::BatchSizeOptimizer;
use execbridge_pipeline::ExecutionPipeline;
use execbridge_publish::{AsyncPublisher, KafkaTransport};
use execbridge_store::PgExecutionStore;
use execbridge_tradeclient::HttpTradeServiceClient;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// How often the batch-size optimizer is allowed to act on a new
/// observation (§4.8, "not more than once per observation window"). Not a
/// recognized configuration option in §6, so kept as a daemon-local
/// constant rather than invented config surface.
const OPTIMIZER_OBSERVATION_WINDOW: Duration = Duration::from_secs(5);

/// Kafka per-send timeout. Bounds how long a single publish attempt may
/// take before `KafkaTransport::send` reports failure to the retry loop.
const KAFKA_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cfg = BridgeConfig::load_from_env().context("failed to load configuration")?;

    let pool = execbridge_store::connect(&cfg.database).await?;
    execbridge_store::migrate(&pool).await?;
    let store = Arc::new(PgExecutionStore::new(pool));

    let security_transport = HttpSecurityTransport::new(cfg.security_service.base_url.clone(), Duration::from_secs(2))
        .context("failed to build security-service HTTP client")?;
    let enricher = Arc::new(SecurityEnricher::new(
        security_transport,
        cfg.security_service.cache_ttl,
        cfg.security_service.cache_max_size,
    ));

    let trade_client = Arc::new(
        HttpTradeServiceClient::new(&cfg.trade_service).context("failed to build trade-service HTTP client")?,
    );

    let kafka_transport =
        KafkaTransport::new(&cfg.kafka.bootstrap_servers, KAFKA_SEND_TIMEOUT).context("failed to build Kafka producer")?;
    let publisher = Arc::new(AsyncPublisher::new(
        kafka_transport,
        cfg.kafka.clone(),
        cfg.performance.circuit_breaker_failure_threshold,
        cfg.performance.circuit_breaker_recovery_timeout,
        cfg.batch.enable_async_kafka,
    ));

    let optimizer = Arc::new(BatchSizeOptimizer::new(
        cfg.batch.bulk_insert_batch_size,
        cfg.performance.min_batch_size,
        cfg.performance.max_batch_size,
        cfg.performance.enable_dynamic_batch_sizing,
        OPTIMIZER_OBSERVATION_WINDOW,
    ));

    let pipeline = Arc::new(ExecutionPipeline::new(
        store.clone(),
        publisher,
        enricher.clone(),
        trade_client,
        optimizer,
        cfg.database.clone(),
        cfg.batch.clone(),
    ));

    let bind_addr: SocketAddr = cfg.bind_addr.parse().with_context(|| format!("invalid bind address {}", cfg.bind_addr))?;
    let shared = Arc::new(AppState::new(store, enricher, pipeline, cfg));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    info!("execbridge-daemon listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, draining in-flight requests");
}

/// CORS: allow only localhost origins (dev convenience; production fronts
/// this with a gateway, per §1's "HTTP router ... not redesigned here").
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = ["http://localhost", "http://127.0.0.1", "http://localhost:3000", "http://127.0.0.1:3000"];

    let origins: Vec<HeaderValue> = allowed_origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
