//! Broadcast fan-out subsystem
//!
//! One [`BroadcastManager`] per process owns the job registry. Each
//! submitted job fans its text out to every recipient under a bounded
//! concurrency ceiling, while a companion task keeps a status message in
//! the admin chat fresh. Jobs are cancellable mid-flight and keep their
//! partial counters.

pub mod job;
pub mod manager;
pub mod status;

// Re-exports for convenience
pub use job::{BroadcastJob, BroadcastJobState, JobId};
pub use manager::{BroadcastConfig, BroadcastManager};
pub use status::BroadcastStatus;
