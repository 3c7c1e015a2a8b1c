//! Services orchestrating the pipeline components.

mod ingest;

pub use ingest::{run_source, RunOptions, RunSummary, StopReason, MAX_CONSECUTIVE_FAILURES};
