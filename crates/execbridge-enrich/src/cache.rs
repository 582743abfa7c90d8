use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use execbridge_schemas::Security;
use moka::future::Cache;

use crate::client::SecurityTransport;

/// Point-in-time view of the cache's load behaviour (§4.2, "Exposes cache
/// stats: size, hit-rate, load penalty").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub size: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Read-through cache resolving `securityId` -> `ticker` (C2).
///
/// A cache miss issues one outbound call via the injected [`SecurityTransport`]
/// and caches whatever comes back — including an absent ticker, so a security
/// the catalog genuinely has no ticker for doesn't re-trigger a lookup on
/// every request within the TTL window.
pub struct SecurityEnricher<T: SecurityTransport> {
    cache: Cache<String, Option<String>>,
    transport: T,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: SecurityTransport> SecurityEnricher<T> {
    pub fn new(transport: T, ttl: Duration, max_size: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_size)
            .build();
        Self { cache, transport, hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Resolve `security_id` to an enriched [`Security`]. Always succeeds —
    /// callers get a ticker-less `Security` on any miss/failure, per §4.2.
    pub async fn enrich(&self, security_id: &str) -> Security {
        if let Some(ticker) = self.cache.get(security_id).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Security { security_id: security_id.to_string(), ticker };
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let ticker = self.transport.fetch_ticker(security_id).await;
        self.cache.insert(security_id.to_string(), ticker.clone()).await;
        Security { security_id: security_id.to_string(), ticker }
    }

    /// Reverse lookup used by `GET /executions?ticker=...` (§6): scan cached
    /// entries for a matching ticker. Only consults what's already cached —
    /// it does not attempt to resolve a ticker the cache has never seen,
    /// since the security-catalog contract has no ticker-keyed lookup.
    pub fn find_security_id_by_ticker(&self, ticker: &str) -> Option<String> {
        self.cache
            .iter()
            .find(|(_, v)| v.as_deref() == Some(ticker))
            .map(|(k, _)| k.as_ref().clone())
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: self.cache.entry_count(),
            hits,
            misses,
            hit_rate: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
        }
    }
}

pub type SharedSecurityEnricher<T> = Arc<SecurityEnricher<T>>;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingTransport {
        calls: AtomicUsize,
        ticker: Option<String>,
    }

    #[async_trait]
    impl SecurityTransport for CountingTransport {
        async fn fetch_ticker(&self, _security_id: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.ticker.clone()
        }
    }

    #[tokio::test]
    async fn miss_then_hit_calls_transport_once() {
        let transport = CountingTransport { calls: AtomicUsize::new(0), ticker: Some("AAPL".into()) };
        let enricher = SecurityEnricher::new(transport, Duration::from_secs(300), 10_000);

        let a = enricher.enrich("SEC1").await;
        let b = enricher.enrich("SEC1").await;

        assert_eq!(a.ticker.as_deref(), Some("AAPL"));
        assert_eq!(b.ticker.as_deref(), Some("AAPL"));
        assert_eq!(enricher.transport.calls.load(Ordering::Relaxed), 1);

        let stats = enricher.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn absent_ticker_is_cached_not_retried() {
        let transport = CountingTransport { calls: AtomicUsize::new(0), ticker: None };
        let enricher = SecurityEnricher::new(transport, Duration::from_secs(300), 10_000);

        let a = enricher.enrich("SEC2").await;
        let b = enricher.enrich("SEC2").await;

        assert!(a.ticker.is_none());
        assert!(b.ticker.is_none());
        assert_eq!(enricher.transport.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn reverse_lookup_finds_cached_ticker() {
        let transport = CountingTransport { calls: AtomicUsize::new(0), ticker: Some("MSFT".into()) };
        let enricher = SecurityEnricher::new(transport, Duration::from_secs(300), 10_000);

        enricher.enrich("SEC3").await;
        assert_eq!(enricher.find_security_id_by_ticker("MSFT"), Some("SEC3".to_string()));
        assert_eq!(enricher.find_security_id_by_ticker("NOPE"), None);
    }
}
