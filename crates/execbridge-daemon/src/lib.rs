//! execbridge-daemon: the Axum binary wiring C1–C10 together behind the
//! HTTP surface in spec §6. `main.rs` is intentionally thin — it loads
//! config, constructs the shared state, and starts the server; all route
//! handlers live in `routes.rs`, all shared state types live in `state.rs`.

pub mod routes;
pub mod state;
