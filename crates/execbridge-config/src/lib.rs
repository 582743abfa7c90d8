//! Validated configuration record, loaded once at startup and handed to
//! every component by reference (no hidden ambient config lookups below
//! `main`).
//!
//! Every option is read from an environment variable with a spec-mandated
//! default, then bounds-checked; a violated bound fails fast with
//! `anyhow::Context` rather than silently falling back, mirroring how the
//! rest of this workspace treats configuration as load-bearing, not
//! best-effort.

use std::time::Duration;

use anyhow::{ensure, Context, Result};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub bulk_insert_batch_size: u32,
    pub max_concurrent_batches: u32,
    pub enable_async_kafka: bool,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    pub enable_dead_letter_queue: bool,
    pub bootstrap_servers: String,
    pub topic: String,
    pub dead_letter_topic: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_pool_size: u32,
    pub connection_timeout: Duration,
    pub max_lifetime: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    pub enable_dynamic_batch_sizing: bool,
    pub min_batch_size: u32,
    pub max_batch_size: u32,
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_recovery_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TradeServiceConfig {
    pub base_url: String,
    pub retry_enabled: bool,
    pub retry_max_attempts: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SecurityServiceConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
    pub cache_max_size: u64,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub bind_addr: String,
    pub batch: BatchConfig,
    pub kafka: KafkaConfig,
    pub database: DatabaseConfig,
    pub performance: PerformanceConfig,
    pub trade_service: TradeServiceConfig,
    pub security_service: SecurityServiceConfig,
}

pub const ENV_DB_URL: &str = "EXECBRIDGE_DATABASE_URL";

impl BridgeConfig {
    /// Load from environment variables, applying defaults, then validate.
    pub fn load_from_env() -> Result<Self> {
        let cfg = BridgeConfig {
            bind_addr: env_str("EXECBRIDGE_BIND_ADDR", "127.0.0.1:8084"),
            batch: BatchConfig {
                bulk_insert_batch_size: env_u32("EXECBRIDGE_BATCH_BULK_INSERT_SIZE", 500)?,
                max_concurrent_batches: env_u32("EXECBRIDGE_BATCH_MAX_CONCURRENT", 10)?,
                enable_async_kafka: env_bool("EXECBRIDGE_BATCH_ENABLE_ASYNC_KAFKA", true)?,
            },
            kafka: KafkaConfig {
                max_attempts: env_u32("EXECBRIDGE_KAFKA_MAX_ATTEMPTS", 3)?,
                initial_delay: Duration::from_millis(env_u32("EXECBRIDGE_KAFKA_INITIAL_DELAY_MS", 1_000)? as u64),
                backoff_multiplier: env_f64("EXECBRIDGE_KAFKA_BACKOFF_MULTIPLIER", 2.0)?,
                max_delay: Duration::from_millis(env_u32("EXECBRIDGE_KAFKA_MAX_DELAY_MS", 30_000)? as u64),
                enable_dead_letter_queue: env_bool("EXECBRIDGE_KAFKA_ENABLE_DLQ", true)?,
                bootstrap_servers: env_str("EXECBRIDGE_KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
                topic: env_str("EXECBRIDGE_KAFKA_TOPIC", "orders"),
                dead_letter_topic: env_str("EXECBRIDGE_KAFKA_DLQ_TOPIC", "orders.dlq"),
            },
            database: DatabaseConfig {
                url: std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?,
                max_pool_size: env_u32("EXECBRIDGE_DATABASE_MAX_POOL_SIZE", 20)?,
                connection_timeout: Duration::from_millis(env_u32("EXECBRIDGE_DATABASE_CONNECTION_TIMEOUT_MS", 30_000)? as u64),
                max_lifetime: Duration::from_secs(env_u32("EXECBRIDGE_DATABASE_MAX_LIFETIME_SECS", 1_800)? as u64),
                max_retries: env_u32("EXECBRIDGE_DATABASE_MAX_RETRIES", 3)?,
                retry_delay: Duration::from_millis(env_u32("EXECBRIDGE_DATABASE_RETRY_DELAY_MS", 100)? as u64),
                max_retry_delay: Duration::from_millis(env_u32("EXECBRIDGE_DATABASE_MAX_RETRY_DELAY_MS", 2_000)? as u64),
            },
            performance: PerformanceConfig {
                enable_dynamic_batch_sizing: env_bool("EXECBRIDGE_PERF_ENABLE_DYNAMIC_BATCH_SIZING", true)?,
                min_batch_size: env_u32("EXECBRIDGE_PERF_MIN_BATCH_SIZE", 50)?,
                max_batch_size: env_u32("EXECBRIDGE_PERF_MAX_BATCH_SIZE", 2_000)?,
                circuit_breaker_failure_threshold: env_u32("EXECBRIDGE_PERF_CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5)?,
                circuit_breaker_recovery_timeout: Duration::from_secs(
                    env_u32("EXECBRIDGE_PERF_CIRCUIT_BREAKER_RECOVERY_TIMEOUT_SECS", 60)? as u64,
                ),
            },
            trade_service: TradeServiceConfig {
                base_url: env_str("EXECBRIDGE_TRADE_SERVICE_BASE_URL", "http://localhost:8080"),
                retry_enabled: env_bool("EXECBRIDGE_TRADE_SERVICE_RETRY_ENABLED", true)?,
                retry_max_attempts: env_u32("EXECBRIDGE_TRADE_SERVICE_RETRY_MAX_ATTEMPTS", 2)?,
                timeout: Duration::from_secs(env_u32("EXECBRIDGE_TRADE_SERVICE_TIMEOUT_SECS", 5)? as u64),
            },
            security_service: SecurityServiceConfig {
                base_url: env_str("EXECBRIDGE_SECURITY_SERVICE_BASE_URL", "http://localhost:8081"),
                cache_ttl: Duration::from_secs(env_u32("EXECBRIDGE_SECURITY_CACHE_TTL_SECS", 300)? as u64),
                cache_max_size: env_u32("EXECBRIDGE_SECURITY_CACHE_MAX_SIZE", 10_000)? as u64,
            },
        };

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=10_000).contains(&self.batch.bulk_insert_batch_size),
            "batch.execution.bulkInsertBatchSize out of range [1,10000]: {}",
            self.batch.bulk_insert_batch_size
        );
        ensure!(
            (1..=100).contains(&self.batch.max_concurrent_batches),
            "batch.execution.maxConcurrentBatches out of range [1,100]: {}",
            self.batch.max_concurrent_batches
        );
        ensure!(
            self.performance.min_batch_size > 0
                && self.performance.min_batch_size <= self.performance.max_batch_size,
            "performance.minBatchSize/maxBatchSize invalid: {}/{}",
            self.performance.min_batch_size,
            self.performance.max_batch_size
        );
        ensure!(
            self.performance.circuit_breaker_failure_threshold > 0,
            "performance.circuitBreakerFailureThreshold must be > 0"
        );
        ensure!(self.database.max_pool_size > 0, "database.maxPoolSize must be > 0");
        ensure!(
            self.kafka.backoff_multiplier >= 1.0,
            "kafka.backoffMultiplier must be >= 1.0: {}",
            self.kafka.backoff_multiplier
        );
        ensure!(
            self.trade_service.retry_max_attempts >= 1,
            "trade.service.retry.maxAttempts must be >= 1"
        );
        Ok(())
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match std::env::var(key) {
        Ok(v) => v.parse::<u32>().with_context(|| format!("{key} must be a non-negative integer, got '{v}'")),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(v) => v.parse::<bool>().with_context(|| format!("{key} must be 'true' or 'false', got '{v}'")),
        Err(_) => Ok(default),
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(v) => v.parse::<f64>().with_context(|| format!("{key} must be a number, got '{v}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BridgeConfig {
        BridgeConfig {
            bind_addr: "127.0.0.1:8084".into(),
            batch: BatchConfig { bulk_insert_batch_size: 500, max_concurrent_batches: 10, enable_async_kafka: true },
            kafka: KafkaConfig {
                max_attempts: 3,
                initial_delay: Duration::from_secs(1),
                backoff_multiplier: 2.0,
                max_delay: Duration::from_secs(30),
                enable_dead_letter_queue: true,
                bootstrap_servers: "localhost:9092".into(),
                topic: "orders".into(),
                dead_letter_topic: "orders.dlq".into(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".into(),
                max_pool_size: 20,
                connection_timeout: Duration::from_secs(30),
                max_lifetime: Duration::from_secs(1_800),
                max_retries: 3,
                retry_delay: Duration::from_millis(100),
                max_retry_delay: Duration::from_secs(2),
            },
            performance: PerformanceConfig {
                enable_dynamic_batch_sizing: true,
                min_batch_size: 50,
                max_batch_size: 2_000,
                circuit_breaker_failure_threshold: 5,
                circuit_breaker_recovery_timeout: Duration::from_secs(60),
            },
            trade_service: TradeServiceConfig {
                base_url: "http://localhost:8080".into(),
                retry_enabled: true,
                retry_max_attempts: 2,
                timeout: Duration::from_secs(5),
            },
            security_service: SecurityServiceConfig {
                base_url: "http://localhost:8081".into(),
                cache_ttl: Duration::from_secs(300),
                cache_max_size: 10_000,
            },
        }
    }

    #[test]
    fn default_record_validates() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn inverted_batch_bounds_rejected() {
        let mut cfg = base();
        cfg.performance.min_batch_size = 3_000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_circuit_breaker_threshold_rejected() {
        let mut cfg = base();
        cfg.performance.circuit_breaker_failure_threshold = 0;
        assert!(cfg.validate().is_err());
    }
}
