//! Batch Pipeline orchestrator and Single-Update Path (C7 + C10): wires C1,
//! C2, C3, C4, C5, C6, C8, and C9 together into the two request flows the
//! HTTP layer drives.

mod batch;
mod fill;

pub use batch::ExecutionPipeline;
pub use fill::FillError;
