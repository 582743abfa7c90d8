use std::sync::atomic::{AtomicU64, Ordering};

use crate::circuit::CircuitBreaker;

/// Publish-activity counters (§4.6, "Metrics per publisher"). `circuit_state`
/// and `current_failure_count` are read live off the breaker rather than
/// duplicated here, so they can never drift from the breaker's own view.
#[derive(Default)]
pub struct PublisherMetrics {
    total_attempts: AtomicU64,
    successful_publishes: AtomicU64,
    failed_publishes: AtomicU64,
    retried_publishes: AtomicU64,
    dead_letter_messages: AtomicU64,
    circuit_breaker_opens: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct PublisherMetricsSnapshot {
    pub total_attempts: u64,
    pub successful_publishes: u64,
    pub failed_publishes: u64,
    pub retried_publishes: u64,
    pub dead_letter_messages: u64,
    pub circuit_breaker_opens: u64,
    pub circuit_state: &'static str,
    pub current_failure_count: u32,
    pub success_rate: f64,
}

impl PublisherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_total_attempts(&self) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_successful(&self) {
        self.successful_publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed_publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_retried(&self) {
        self.retried_publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dead_letter(&self) {
        self.dead_letter_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_circuit_breaker_open(&self) {
        self.circuit_breaker_opens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, breaker: &CircuitBreaker) -> PublisherMetricsSnapshot {
        let successful = self.successful_publishes.load(Ordering::Relaxed);
        let failed = self.failed_publishes.load(Ordering::Relaxed);
        let total = successful + failed;
        PublisherMetricsSnapshot {
            total_attempts: self.total_attempts.load(Ordering::Relaxed),
            successful_publishes: successful,
            failed_publishes: failed,
            retried_publishes: self.retried_publishes.load(Ordering::Relaxed),
            dead_letter_messages: self.dead_letter_messages.load(Ordering::Relaxed),
            circuit_breaker_opens: self.circuit_breaker_opens.load(Ordering::Relaxed),
            circuit_state: breaker.state().as_str(),
            current_failure_count: breaker.failure_count(),
            success_rate: if total == 0 { 0.0 } else { successful as f64 / total as f64 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn success_rate_derived_from_counters() {
        let metrics = PublisherMetrics::new();
        let breaker = CircuitBreaker::new(5, Duration::from_secs(60));
        metrics.inc_successful();
        metrics.inc_successful();
        metrics.inc_failed();
        let snap = metrics.snapshot(&breaker);
        assert_eq!(snap.success_rate, 2.0 / 3.0);
    }
}
