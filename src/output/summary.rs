//! Final run summary
//!
//! This module assembles the counts of one crawl run and prints them once the
//! run and the housekeeping sweep are over.

use crate::crawler::progress::percentage;
use std::time::Duration;

/// Summary statistics for a crawl run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSummary {
    /// Page indices scheduled for this run
    pub total: usize,

    /// Indices whose record was persisted
    pub succeeded: usize,

    /// Indices confirmed empty
    pub empty: usize,

    /// Indices that failed every attempt
    pub abandoned: usize,

    /// Wall-clock duration of the fetch loop
    pub elapsed: Duration,

    /// SHA-256 of the configuration in effect
    pub config_hash: String,

    /// The run was cut short by a shutdown signal
    pub interrupted: bool,

    /// Indices held by the consolidated results file after the merge
    pub results_indices: Option<usize>,

    /// Artifacts deleted by the sweep, when it ran
    pub removed: Option<usize>,
}

impl CrawlSummary {
    /// Indices that reached a terminal state
    pub fn resolved(&self) -> usize {
        self.succeeded + self.empty + self.abandoned
    }

    /// Share of scheduled indices that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        percentage(self.succeeded, self.total)
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Page indices scheduled: {}", summary.total);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!("  Config hash: {}", summary.config_hash);
    if summary.interrupted {
        println!(
            "  Interrupted after {} of {} indices",
            summary.resolved(),
            summary.total
        );
    }
    println!();

    println!("Pages by State:");
    for (label, count) in [
        ("Succeeded", summary.succeeded),
        ("Empty", summary.empty),
        ("Abandoned", summary.abandoned),
    ] {
        let share = if summary.total > 0 {
            percentage(count, summary.total)
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, share);
    }
    println!();

    if let Some(indices) = summary.results_indices {
        println!("Results file now holds {} indices", indices);
    }
    if let Some(removed) = summary.removed {
        println!("Housekeeping removed {} artifacts", removed);
    }

    println!(
        "Success Rate: {:.1}% ({} / {} indices documented)",
        summary.success_rate(),
        summary.succeeded,
        summary.total
    );
}
