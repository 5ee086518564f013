//! Sync orchestration and record processing
//!
//! - [`engine`] - the job driver and due-instance sweep
//! - [`processor`] - dependency-aware entity writes
//! - [`summary`] - run counters, job results and sweep summaries

pub mod engine;
pub mod processor;
pub mod summary;

pub use engine::SyncEngine;
pub use processor::RecordProcessor;
pub use summary::{RunTally, SweepEntry, SweepSummary, SyncJobResult};
