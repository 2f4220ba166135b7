//! Run progress counters and their reporting

use crate::crawler::PageState;
use crate::index::PageIndex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives one notification per resolved page index
pub trait ProgressReporter: Send + Sync {
    /// Called after `index` reached its terminal `state`
    fn report(&self, index: &PageIndex, state: PageState, completed: usize, total: usize);
}

/// Reports progress through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, index: &PageIndex, state: PageState, completed: usize, total: usize) {
        tracing::info!(
            "Progress: {}/{} ({:.1}%) - {} {}",
            completed,
            total,
            percentage(completed, total),
            index,
            state
        );
    }
}

/// Share of `total` that is `completed`, in percent
pub fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Counters of one crawl run
#[derive(Debug)]
pub struct CrawlProgress {
    total: usize,
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    empty: AtomicUsize,
    abandoned: AtomicUsize,
}

impl CrawlProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            empty: AtomicUsize::new(0),
            abandoned: AtomicUsize::new(0),
        }
    }

    /// Counts a resolved index and returns the number completed so far
    pub fn record(&self, state: PageState) -> usize {
        let counter = match state {
            PageState::Succeeded => &self.succeeded,
            PageState::EmptyConfirmed => &self.empty,
            PageState::Abandoned | PageState::Pending { .. } => &self.abandoned,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn empty(&self) -> usize {
        self.empty.load(Ordering::SeqCst)
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}
