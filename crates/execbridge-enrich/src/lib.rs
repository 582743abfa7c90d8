//! Security read-through cache (C2): resolves `securityId` to a ticker via
//! outbound HTTP, bounded by a TTL/LRU cache so the hot path never blocks on
//! the security-catalog service for an id it has seen recently.

mod cache;
mod client;
mod wire;

pub use cache::{CacheStats, SecurityEnricher, SharedSecurityEnricher};
pub use client::{HttpSecurityTransport, SecurityTransport};
