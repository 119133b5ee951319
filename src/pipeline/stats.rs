//! Batch-wide statistics helpers.
//!
//! This module defines the `BatchStats` structure used to track execution
//! metrics across a batch of scans and the `StatsManager` helper that
//! coordinates thread-safe updates to these metrics.

use std::fmt;
use std::sync::Mutex;

/// Statistics for a batch of scans.
///
/// Tracks how many images were scanned, how the successes split between
/// the primary fast path and the detection fallback, and the average scan
/// time.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// The total number of images scanned.
    pub total_scanned: usize,
    /// The number of scans that decoded at least one symbol.
    pub successful_scans: usize,
    /// Successes where the primary whole-image decode was enough.
    pub primary_hits: usize,
    /// Successes that needed the detection fallback ladder.
    pub fallback_hits: usize,
    /// The number of scans that exhausted every strategy.
    pub failed_scans: usize,
    /// The average scan time in milliseconds.
    pub average_scan_time_ms: f64,
}

impl BatchStats {
    /// Creates a new BatchStats instance with zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the success rate as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            (self.successful_scans as f64 / self.total_scanned as f64) * 100.0
        }
    }

    /// Returns the average processing speed in images per second.
    pub fn images_per_second(&self) -> f64 {
        if self.average_scan_time_ms == 0.0 {
            0.0
        } else {
            1000.0 / self.average_scan_time_ms
        }
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch statistics:")?;
        writeln!(f, "  Total scanned: {}", self.total_scanned)?;
        writeln!(
            f,
            "  Successful: {} ({:.1}%)",
            self.successful_scans,
            self.success_rate()
        )?;
        writeln!(
            f,
            "  Primary hits: {}, fallback hits: {}",
            self.primary_hits, self.fallback_hits
        )?;
        writeln!(f, "  Failed: {}", self.failed_scans)?;
        writeln!(f, "  Average scan time: {:.2} ms", self.average_scan_time_ms)?;
        writeln!(
            f,
            "  Processing speed: {:.2} images/sec",
            self.images_per_second()
        )?;
        Ok(())
    }
}

/// Thread-safe accumulator for batch statistics.
#[derive(Debug, Default)]
pub struct StatsManager {
    /// Shared statistics state guarded by a mutex.
    stats: Mutex<BatchStats>,
}

impl StatsManager {
    /// Creates a new `StatsManager` instance with zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current statistics snapshot.
    pub fn snapshot(&self) -> BatchStats {
        self.stats.lock().unwrap().clone()
    }

    /// Records one completed scan.
    ///
    /// # Arguments
    ///
    /// * `success` - Whether the scan decoded at least one symbol.
    /// * `via_primary` - Whether the primary whole-image decode won.
    /// * `elapsed_ms` - Wall-clock time of the scan.
    pub fn record(&self, success: bool, via_primary: bool, elapsed_ms: u64) {
        let mut stats = self.stats.lock().unwrap();
        let previous_total = stats.total_scanned as f64;
        stats.total_scanned += 1;
        if success {
            stats.successful_scans += 1;
            if via_primary {
                stats.primary_hits += 1;
            } else {
                stats.fallback_hits += 1;
            }
        } else {
            stats.failed_scans += 1;
        }
        stats.average_scan_time_ms = (stats.average_scan_time_ms * previous_total
            + elapsed_ms as f64)
            / stats.total_scanned as f64;
    }
}
