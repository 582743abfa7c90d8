//! Typed row persistence for `execution` (C1): bulk insert, bulk sent-timestamp
//! update, optimistic-version update, and filtered pagination.
//!
//! Transient errors (deadlock, timeout, connection loss) are surfaced
//! unchanged so the caller (C5) can classify and retry; constraint
//! violations and value-range errors are surfaced as non-transient.

mod errors;
mod pool;
mod query;
mod row;
mod store;
mod tx;

pub use errors::StoreError;
pub use pool::{connect, migrate};
pub use store::{ExecutionMutation, ExecutionStore, PgExecutionStore};
pub use tx::ExecutionTx;
