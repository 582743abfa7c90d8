use std::sync::Arc;
use std::time::{Duration, Instant};

use execbridge_config::KafkaConfig;
use tokio::task::JoinHandle;

use crate::circuit::CircuitBreaker;
use crate::metrics::{PublisherMetrics, PublisherMetricsSnapshot};
use crate::transport::PublishTransport;

/// One execution to publish. `key` is the stringified execution id (§6,
/// "Wire format to message bus").
#[derive(Debug, Clone)]
pub struct PublishMessage {
    pub execution_id: i64,
    pub key: String,
    pub value: String,
}

/// Result of one `submit` call (§4.6). Exactly one of `success`/`skipped`
/// is meaningful at a time: `skipped` implies no publish was attempted at
/// all (publisher globally disabled).
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub success: bool,
    pub skipped: bool,
    pub execution_id: i64,
    pub attempt_count: u32,
    pub error_message: Option<String>,
}

impl PublishResult {
    fn success(execution_id: i64, attempt_count: u32) -> Self {
        Self { success: true, skipped: false, execution_id, attempt_count, error_message: None }
    }

    fn failed(execution_id: i64, attempt_count: u32, error_message: impl Into<String>) -> Self {
        Self { success: false, skipped: false, execution_id, attempt_count, error_message: Some(error_message.into()) }
    }

    fn skipped(execution_id: i64) -> Self {
        Self { success: false, skipped: true, execution_id, attempt_count: 0, error_message: None }
    }
}

/// Async Publisher (C6): one independent cooperative retry loop per
/// message, a process-wide circuit breaker, and dead-letter routing once
/// retries are exhausted. `submit` never blocks the caller — it hands back
/// a `JoinHandle` the caller may await (e.g. for the pipeline's bounded
/// metrics wait in §4.7 step 6) or drop entirely.
pub struct AsyncPublisher<T: PublishTransport + 'static> {
    transport: Arc<T>,
    breaker: Arc<CircuitBreaker>,
    metrics: Arc<PublisherMetrics>,
    cfg: KafkaConfig,
    enabled: bool,
}

impl<T: PublishTransport + 'static> AsyncPublisher<T> {
    pub fn new(transport: T, cfg: KafkaConfig, circuit_breaker_threshold: u32, recovery_timeout: Duration, enabled: bool) -> Self {
        Self {
            transport: Arc::new(transport),
            breaker: Arc::new(CircuitBreaker::new(circuit_breaker_threshold, recovery_timeout)),
            metrics: Arc::new(PublisherMetrics::new()),
            cfg,
            enabled,
        }
    }

    pub fn metrics_snapshot(&self) -> PublisherMetricsSnapshot {
        self.metrics.snapshot(&self.breaker)
    }

    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }

    /// Submit one message. Returns a handle the caller may await but is not
    /// required to (§5, "the submitter is never blocked").
    pub fn submit(&self, message: PublishMessage) -> JoinHandle<PublishResult> {
        if !self.enabled {
            let execution_id = message.execution_id;
            return tokio::spawn(async move { PublishResult::skipped(execution_id) });
        }

        let transport = self.transport.clone();
        let breaker = self.breaker.clone();
        let metrics = self.metrics.clone();
        let cfg = self.cfg.clone();

        tokio::spawn(async move { run_retry_loop(transport, breaker, metrics, cfg, message).await })
    }
}

async fn run_retry_loop<T: PublishTransport>(
    transport: Arc<T>,
    breaker: Arc<CircuitBreaker>,
    metrics: Arc<PublisherMetrics>,
    cfg: KafkaConfig,
    message: PublishMessage,
) -> PublishResult {
    if !breaker.allow_request() {
        metrics.inc_circuit_breaker_open();
        execbridge_perf::kafka_circuit_breaker_opened();
        return PublishResult::failed(message.execution_id, 0, "Circuit breaker is open");
    }

    let mut delay = cfg.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        metrics.inc_total_attempts();

        let send_started = Instant::now();
        let send_result = transport.send(&cfg.topic, &message.key, &message.value).await;
        execbridge_perf::kafka_publish_duration(send_started.elapsed());

        match send_result {
            Ok(()) => {
                breaker.record_success();
                metrics.inc_successful();
                execbridge_perf::kafka_publish_outcome(true, attempt > 1);
                return PublishResult::success(message.execution_id, attempt);
            }
            Err(err) => {
                metrics.inc_failed();

                if attempt >= cfg.max_attempts {
                    breaker.record_failure();
                    execbridge_perf::kafka_publish_outcome(false, attempt > 1);
                    if cfg.enable_dead_letter_queue {
                        send_to_dead_letter(&transport, &metrics, &cfg, &message).await;
                    }
                    return PublishResult::failed(message.execution_id, attempt, err.to_string());
                }

                metrics.inc_retried();
                tokio::time::sleep(delay).await;
                delay = scale_delay(delay, cfg.backoff_multiplier, cfg.max_delay);
            }
        }
    }
}

async fn send_to_dead_letter<T: PublishTransport>(
    transport: &Arc<T>,
    metrics: &Arc<PublisherMetrics>,
    cfg: &KafkaConfig,
    message: &PublishMessage,
) {
    match transport.send(&cfg.dead_letter_topic, &message.key, &message.value).await {
        Ok(()) => metrics.inc_dead_letter(),
        Err(err) => {
            tracing::error!(execution_id = message.execution_id, error = %err, "dead-letter publish failed");
        }
    }
}

fn scale_delay(current: Duration, multiplier: f64, max: Duration) -> Duration {
    let scaled = current.as_secs_f64() * multiplier;
    Duration::from_secs_f64(scaled).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cfg(max_attempts: u32) -> KafkaConfig {
        KafkaConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(10),
            enable_dead_letter_queue: true,
            bootstrap_servers: "localhost:9092".into(),
            topic: "orders".into(),
            dead_letter_topic: "orders.dlq".into(),
        }
    }

    fn message(id: i64) -> PublishMessage {
        PublishMessage { execution_id: id, key: id.to_string(), value: format!("{{\"id\":{id}}}") }
    }

    struct AlwaysFailsTransport {
        calls: AtomicUsize,
        dlq_calls: AtomicUsize,
    }

    #[async_trait]
    impl PublishTransport for AlwaysFailsTransport {
        async fn send(&self, topic: &str, _key: &str, _value: &str) -> anyhow::Result<()> {
            if topic.ends_with(".dlq") {
                self.dlq_calls.fetch_add(1, Ordering::SeqCst);
            } else {
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
            anyhow::bail!("transport down")
        }
    }

    struct AlwaysOkTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PublishTransport for AlwaysOkTransport {
        async fn send(&self, _topic: &str, _key: &str, _value: &str) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn success_completes_with_attempt_one() {
        let publisher = AsyncPublisher::new(AlwaysOkTransport { calls: AtomicUsize::new(0) }, cfg(3), 5, Duration::from_secs(60), true);
        let result = publisher.submit(message(1)).await.unwrap();
        assert!(result.success);
        assert_eq!(result.attempt_count, 1);
    }

    #[tokio::test]
    async fn disabled_publisher_skips() {
        let publisher = AsyncPublisher::new(AlwaysOkTransport { calls: AtomicUsize::new(0) }, cfg(3), 5, Duration::from_secs(60), false);
        let result = publisher.submit(message(1)).await.unwrap();
        assert!(result.skipped);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn exhausted_retries_send_exactly_one_dlq_message() {
        let publisher = AsyncPublisher::new(
            AlwaysFailsTransport { calls: AtomicUsize::new(0), dlq_calls: AtomicUsize::new(0) },
            cfg(3),
            10,
            Duration::from_secs(60),
            true,
        );
        let result = publisher.submit(message(1)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.attempt_count, 3);
        assert_eq!(publisher.transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(publisher.transport.dlq_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dlq_disabled_sends_zero_dlq_messages() {
        let mut config = cfg(2);
        config.enable_dead_letter_queue = false;
        let publisher = AsyncPublisher::new(
            AlwaysFailsTransport { calls: AtomicUsize::new(0), dlq_calls: AtomicUsize::new(0) },
            config,
            10,
            Duration::from_secs(60),
            true,
        );
        publisher.submit(message(1)).await.unwrap();
        assert_eq!(publisher.transport.dlq_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn circuit_opens_after_threshold_and_blocks_fourth_submission() {
        let publisher = Arc::new(AsyncPublisher::new(
            AlwaysFailsTransport { calls: AtomicUsize::new(0), dlq_calls: AtomicUsize::new(0) },
            cfg(1),
            3,
            Duration::from_secs(60),
            true,
        ));

        for i in 0..3 {
            let result = publisher.submit(message(i)).await.unwrap();
            assert!(!result.success);
        }
        assert_eq!(publisher.transport.calls.load(Ordering::SeqCst), 3);

        let fourth = publisher.submit(message(99)).await.unwrap();
        assert!(!fourth.success);
        assert_eq!(fourth.error_message.as_deref(), Some("Circuit breaker is open"));
        // Transport was not invoked a fourth time.
        assert_eq!(publisher.transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn circuit_counts_failed_messages_not_failed_attempts() {
        // Spec scenario 6, literally: threshold=3, maxAttempts>1. The breaker
        // must advance once per message that exhausts its own retries, so
        // 3 failing messages invoke the transport 3 * maxAttempts times
        // before the fourth submission is rejected at `allow_request`.
        let publisher = Arc::new(AsyncPublisher::new(
            AlwaysFailsTransport { calls: AtomicUsize::new(0), dlq_calls: AtomicUsize::new(0) },
            cfg(3),
            3,
            Duration::from_secs(60),
            true,
        ));

        for i in 0..3 {
            let result = publisher.submit(message(i)).await.unwrap();
            assert!(!result.success);
            assert_eq!(result.attempt_count, 3);
        }
        assert_eq!(publisher.transport.calls.load(Ordering::SeqCst), 9);

        let fourth = publisher.submit(message(99)).await.unwrap();
        assert!(!fourth.success);
        assert_eq!(fourth.error_message.as_deref(), Some("Circuit breaker is open"));
        assert_eq!(publisher.transport.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn reset_clears_open_breaker() {
        let publisher = AsyncPublisher::new(
            AlwaysFailsTransport { calls: AtomicUsize::new(0), dlq_calls: AtomicUsize::new(0) },
            cfg(1),
            1,
            Duration::from_secs(60),
            true,
        );
        publisher.submit(message(1)).await.unwrap();
        assert_eq!(publisher.metrics_snapshot().circuit_state, "OPEN");
        publisher.reset_circuit_breaker();
        assert_eq!(publisher.metrics_snapshot().circuit_state, "CLOSED");
    }

    #[test]
    fn scale_delay_caps_at_max() {
        let scaled = scale_delay(Duration::from_secs(20), 2.0, Duration::from_secs(30));
        assert_eq!(scaled, Duration::from_secs(30));
    }
}
