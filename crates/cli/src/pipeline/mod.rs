//! Capture orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{CaptureConfig, CaptureRun};
pub use stats::RunStats;
