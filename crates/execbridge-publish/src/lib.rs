//! Async Publisher (C6): per-message publish with exponential backoff,
//! process-wide circuit breaker, and dead-letter routing.

mod circuit;
mod metrics;
mod publisher;
mod transport;

pub use circuit::{CircuitBreaker, CircuitState};
pub use metrics::{PublisherMetrics, PublisherMetricsSnapshot};
pub use publisher::{AsyncPublisher, PublishMessage, PublishResult};
pub use transport::{KafkaTransport, PublishTransport};
