//! Run report
//!
//! This module summarises one harvest for the operator: how discovery ended,
//! how many details were collected, and which identifiers failed and why.

use crate::crawler::FetchFailure;
use crate::state::StopReason;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one harvest run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Index pages fetched successfully
    pub pages_fetched: u32,

    /// Why discovery stopped
    pub discovery_stop: StopReason,

    /// Unique identifiers discovered
    pub identifiers: usize,

    /// Records written (including identifier-only records)
    pub records: usize,

    /// Identifiers whose detail could not be fetched
    pub failures: Vec<(String, FetchFailure)>,

    /// Records whose document had no detail structure
    pub empty_extractions: usize,

    /// Identifiers skipped because the run was cancelled
    pub unfinished: usize,

    /// Columns of the written table
    pub schema: Vec<String>,

    /// Where the table was written, if anything was written
    pub output_path: Option<PathBuf>,

    pub cancelled: bool,

    pub elapsed: Duration,
}

impl HarvestReport {
    /// Returns detail success rate as a percentage of discovered identifiers
    pub fn success_rate(&self) -> f64 {
        if self.identifiers == 0 {
            return 0.0;
        }
        (self.records as f64 / self.identifiers as f64) * 100.0
    }

    /// Counts failures by kind
    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, failure) in &self.failures {
            *counts.entry(failure.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &HarvestReport) {
    println!("=== Harvest Report ===\n");

    println!("Discovery:");
    println!("  Index pages fetched: {}", report.pages_fetched);
    println!("  Stopped because: {}", report.discovery_stop);
    println!("  Identifiers found: {}", report.identifiers);
    println!();

    println!("Collection:");
    println!(
        "  Records: {} ({:.1}%)",
        report.records,
        report.success_rate()
    );
    println!("  Empty extractions: {}", report.empty_extractions);
    println!("  Failures: {}", report.failures.len());
    for (kind, count) in report.failure_counts() {
        println!("    {}: {}", kind, count);
    }
    if report.unfinished > 0 {
        println!("  Unfinished (cancelled): {}", report.unfinished);
    }
    println!();

    println!("Output:");
    match &report.output_path {
        Some(path) => println!(
            "  {} ({} columns)",
            path.display(),
            report.schema.len()
        ),
        None => println!("  nothing written"),
    }
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());

    if report.cancelled {
        println!("\n! Run was cancelled; the table holds partial results");
    }
}
