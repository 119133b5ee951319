//! Batch and streaming scanning.
//!
//! The pipeline holds no shared mutable state across scan calls, so a
//! batch can run sequentially, surfacing each report as it completes, or
//! in parallel across worker threads without locks.

use crate::pipeline::attempt::{ScanReport, Strategy};
use crate::pipeline::orchestrator::QrScanner;
use crate::pipeline::stats::{BatchStats, StatsManager};
use image::RgbaImage;
use rayon::prelude::*;
use tracing::info;

/// The reports and aggregate statistics of one batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// One report per input image, in input order.
    pub reports: Vec<ScanReport>,
    /// Aggregate metrics over the whole batch.
    pub stats: BatchStats,
}

fn record(stats: &StatsManager, report: &ScanReport) {
    let via_primary = report.winning_strategy() == Some(Strategy::Primary);
    stats.record(report.is_success(), via_primary, report.elapsed_ms);
}

impl QrScanner {
    /// Scans images sequentially, surfacing each report through the
    /// callback as soon as it is ready.
    pub fn scan_each<F>(&self, images: &[RgbaImage], mut on_report: F) -> BatchOutcome
    where
        F: FnMut(usize, &ScanReport),
    {
        let stats = StatsManager::new();
        let mut reports = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let report = self.scan(image);
            record(&stats, &report);
            on_report(index, &report);
            reports.push(report);
        }

        let stats = stats.snapshot();
        info!(
            "batch finished: {}/{} decoded",
            stats.successful_scans, stats.total_scanned
        );
        BatchOutcome { reports, stats }
    }

    /// Scans images in parallel across the rayon thread pool.
    ///
    /// Reports come back in input order; only the aggregate statistics
    /// are shared between workers.
    pub fn scan_batch(&self, images: &[RgbaImage]) -> BatchOutcome {
        let stats = StatsManager::new();
        let reports: Vec<ScanReport> = images
            .par_iter()
            .map(|image| {
                let report = self.scan(image);
                record(&stats, &report);
                report
            })
            .collect();

        let stats = stats.snapshot();
        info!(
            "batch finished: {}/{} decoded",
            stats.successful_scans, stats.total_scanned
        );
        BatchOutcome { reports, stats }
    }
}
