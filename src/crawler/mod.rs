//! Crawler module driving page indices through render, normalize and persist
//!
//! This module contains the core crawling logic, including:
//! - the per-index retry state machine
//! - progress counters and the reporter they feed
//! - the concurrency-bounded fetch orchestrator

mod orchestrator;
pub mod progress;
mod state;

pub use orchestrator::CrawlOrchestrator;
pub use progress::{CrawlProgress, LogProgress, ProgressReporter};
pub use state::{transition, FetchOutcome, PageState};
