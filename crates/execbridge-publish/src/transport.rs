use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

/// Transport seam for the message-bus send, so the retry/circuit-breaker
/// logic in `publisher.rs` can be driven against a fake producer in tests
/// instead of a live Kafka broker.
#[async_trait]
pub trait PublishTransport: Send + Sync {
    async fn send(&self, topic: &str, key: &str, value: &str) -> anyhow::Result<()>;
}

/// `rdkafka`-backed transport. One `FutureProducer` handles every topic this
/// process publishes to (`orders` and `orders.dlq`) — a producer is a
/// connection pool in its own right, not a per-topic resource.
pub struct KafkaTransport {
    producer: FutureProducer,
    send_timeout: Duration,
}

impl KafkaTransport {
    pub fn new(bootstrap_servers: &str, send_timeout: Duration) -> anyhow::Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", send_timeout.as_millis().to_string())
            .create()?;
        Ok(Self { producer, send_timeout })
    }
}

#[async_trait]
impl PublishTransport for KafkaTransport {
    async fn send(&self, topic: &str, key: &str, value: &str) -> anyhow::Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(value);
        self.producer
            .send(record, Timeout::After(self.send_timeout))
            .await
            .map_err(|(err, _msg)| anyhow::anyhow!("kafka send to {topic} failed: {err}"))?;
        Ok(())
    }
}
