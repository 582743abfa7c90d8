use std::time::Duration;

use async_trait::async_trait;
use execbridge_config::TradeServiceConfig;
use execbridge_schemas::ExecutionStatus;
use rust_decimal::Decimal;

use crate::wire::{FillUpdateBody, TradeExecutionVersionResponse};

/// A fill update to reflect onto the upstream trade service (§4.3).
#[derive(Debug, Clone)]
pub struct FillUpdate {
    pub execution_status: ExecutionStatus,
    pub quantity_filled: Decimal,
    pub version: i32,
}

/// Outbound HTTP to the upstream trade service (C3). Both operations are
/// best-effort: a failure is logged and returns an empty/`false` result, it
/// never propagates as an `Err` to the caller (§4.3, "Failures must never
/// fail the caller").
#[async_trait]
pub trait TradeServiceClient: Send + Sync {
    /// `GET /api/v1/executions/{externalId}` -> the row's current `version`.
    /// Empty on 404, network error, or a missing/malformed `version` field.
    async fn get_execution_version(&self, external_id: i64) -> Option<i32>;

    /// `PUT /api/v1/executions/{externalId}/fill`. On a 409 version conflict,
    /// re-fetches the current version and retries with it substituted, up to
    /// `retry_max_attempts` total attempts, only if retry is enabled.
    async fn update_execution_fill(&self, external_id: i64, fill: FillUpdate) -> bool;
}

pub struct HttpTradeServiceClient {
    client: reqwest::Client,
    base_url: String,
    retry_enabled: bool,
    retry_max_attempts: u32,
}

impl HttpTradeServiceClient {
    pub fn new(cfg: &TradeServiceConfig) -> anyhow::Result<Self> {
        Self::with_timeout(cfg, cfg.timeout)
    }

    pub fn with_timeout(cfg: &TradeServiceConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            retry_enabled: cfg.retry_enabled,
            retry_max_attempts: cfg.retry_max_attempts.max(1),
        })
    }

    fn execution_url(&self, external_id: i64) -> String {
        format!("{}/api/v1/executions/{}", self.base_url, external_id)
    }
}

#[async_trait]
impl TradeServiceClient for HttpTradeServiceClient {
    async fn get_execution_version(&self, external_id: i64) -> Option<i32> {
        let resp = match self.client.get(self.execution_url(external_id)).send().await {
            Ok(r) => r,
            Err(err) => {
                tracing::debug!(error = %err, external_id, "trade service getExecutionVersion transport error");
                return None;
            }
        };

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), external_id, "trade service getExecutionVersion non-2xx");
            return None;
        }

        match resp.json::<TradeExecutionVersionResponse>().await {
            Ok(body) => Some(body.version),
            Err(err) => {
                tracing::debug!(error = %err, external_id, "trade service getExecutionVersion malformed body");
                None
            }
        }
    }

    async fn update_execution_fill(&self, external_id: i64, fill: FillUpdate) -> bool {
        let mut body = FillUpdateBody {
            execution_status: fill.execution_status,
            quantity_filled: fill.quantity_filled,
            version: fill.version,
        };

        let mut attempt = 1;
        loop {
            let url = format!("{}/fill", self.execution_url(external_id));
            let resp = match self.client.put(&url).json(&body).send().await {
                Ok(r) => r,
                Err(err) => {
                    tracing::warn!(error = %err, external_id, attempt, "trade service updateExecutionFill transport error");
                    return false;
                }
            };

            match resp.status() {
                s if s.is_success() => return true,
                reqwest::StatusCode::CONFLICT => {
                    if !self.retry_enabled || attempt >= self.retry_max_attempts {
                        tracing::warn!(external_id, attempt, "trade service fill update conflict, giving up");
                        return false;
                    }
                    match self.get_execution_version(external_id).await {
                        Some(v) => {
                            body.version = v;
                            attempt += 1;
                            continue;
                        }
                        None => {
                            tracing::warn!(external_id, "trade service version refetch failed after conflict");
                            return false;
                        }
                    }
                }
                reqwest::StatusCode::NOT_FOUND => {
                    tracing::warn!(external_id, "trade service fill update: execution not found");
                    return false;
                }
                other => {
                    tracing::warn!(status = %other, external_id, "trade service fill update non-2xx");
                    return false;
                }
            }
        }
    }
}
