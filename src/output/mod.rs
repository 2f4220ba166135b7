//! Output module for reporting crawl results
//!
//! The artifacts themselves are written by [`crate::storage`]; this module
//! only summarizes a run for the operator.

mod summary;

pub use summary::{print_summary, CrawlSummary};
