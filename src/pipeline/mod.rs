//! The fallback scan pipeline: orchestration, attempt traces, and batch
//! processing.

pub mod attempt;
pub mod batch;
pub mod orchestrator;
pub mod stats;

pub use attempt::{ScanAttempt, ScanReport, Strategy};
pub use batch::BatchOutcome;
pub use orchestrator::QrScanner;
pub use stats::{BatchStats, StatsManager};
