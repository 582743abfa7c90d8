//! Outbound trade-service HTTP client (C3): fetch current version, PUT fill
//! update, retry on version conflict. Never fails the caller — failures are
//! logged and surfaced as an empty/`false` result (§4.3).

mod client;
mod wire;

pub use client::{FillUpdate, HttpTradeServiceClient, TradeServiceClient};
