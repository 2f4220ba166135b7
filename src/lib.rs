//! fin-doc-crawler: a polite crawler for semi-structured API documentation
//!
//! This crate renders the Tsanghi financial-data API documentation pages through
//! a headless-browser render service, normalizes their heterogeneous markup into
//! canonical [`normalizer::DocRecord`]s and persists one snapshot file per page.

pub mod config;
pub mod crawler;
pub mod index;
pub mod normalizer;
pub mod output;
pub mod renderer;
pub mod storage;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid page index: {0}")]
    InvalidIndex(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, FetchOutcome, PageState};
pub use index::{generate_indices, PageIndex};
pub use normalizer::{normalize, DocRecord};
pub use renderer::{PageRenderer, RawExtraction, RenderOutcome};
