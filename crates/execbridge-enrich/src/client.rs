use std::time::Duration;

use async_trait::async_trait;

use crate::wire::SecuritiesResponse;

/// Transport seam for the outbound `GET /api/v1/securities?securityId=...`
/// call, so the cache layer in `cache.rs` can be tested against a fake
/// instead of a live security-catalog service.
#[async_trait]
pub trait SecurityTransport: Send + Sync {
    /// Returns `None` on any failure (network error, non-2xx, malformed
    /// body, or the id simply not being found) — callers never see an
    /// error, per §4.2 ("on any failure returns an empty result").
    async fn fetch_ticker(&self, security_id: &str) -> Option<String>;
}

/// `reqwest`-backed transport with a short, fixed read timeout.
pub struct HttpSecurityTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSecurityTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[async_trait]
impl SecurityTransport for HttpSecurityTransport {
    async fn fetch_ticker(&self, security_id: &str) -> Option<String> {
        let url = format!("{}/api/v1/securities", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[("securityId", security_id)])
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = %r.status(), security_id, "security lookup non-2xx");
                return None;
            }
            Err(err) => {
                tracing::debug!(error = %err, security_id, "security lookup transport error");
                return None;
            }
        };

        let body: SecuritiesResponse = match resp.json().await {
            Ok(b) => b,
            Err(err) => {
                tracing::debug!(error = %err, security_id, "security lookup malformed body");
                return None;
            }
        };

        body.securities
            .into_iter()
            .find(|s| s.security_id == security_id)
            .and_then(|s| s.ticker)
    }
}
