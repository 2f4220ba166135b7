//! Page renderer adapter
//!
//! Documentation pages only show their parameter tables after client-side
//! interaction, so they are rendered by a headless browser behind a render
//! service. This module hides that service behind [`PageRenderer`]:
//! - building the target URL and browser identity for a page index
//! - shipping the interaction script and wait condition
//! - classifying the service's answer as content, empty page or failure

mod extraction;
mod schema;
mod script;
mod service;

pub use extraction::RawExtraction;
pub use schema::{FieldKind, FieldSchema, FieldSpec};
pub use script::{
    interaction_script, CONTENT_MARKERS, EMPTY_TAG, PROCESSED_TAG, TABS_TAG, WAIT_CONDITION,
};
pub use service::{
    build_http_client, classify_response, page_url, HttpRenderService, RenderRequest,
    RenderResponse, Viewport,
};

use crate::index::PageIndex;
use async_trait::async_trait;
use thiserror::Error;

/// Lower-cased fragments of a render failure message that mean "no such page"
pub const EMPTY_SIGNALS: &[&str] = &["404", "not found", "empty", "timeout", "wait condition failed"];

/// Result of one successful render call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The page has content; these are its raw fields
    Rendered(RawExtraction),

    /// The index carries no documentation
    Empty {
        /// Why the page was classified as empty
        reason: String,
    },
}

/// Transient render failures, retried by the orchestrator
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render timed out for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Render service answered HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Render failed for {url}: {message}")]
    Service { url: String, message: String },

    #[error("Undecodable render output for {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid page URL: {0}")]
    Url(#[from] url::ParseError),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Renders documentation pages
///
/// Implementations hold no mutable state shared between calls, so one renderer
/// is used by every concurrent fetch.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders the page at `index` and returns its raw fields
    async fn render(&self, index: &PageIndex) -> Result<RenderOutcome, RenderError>;
}

/// True when a failure message reports a page that does not exist
pub fn is_empty_signal(message: &str) -> bool {
    let message = message.to_lowercase();
    EMPTY_SIGNALS.iter().any(|signal| message.contains(signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signals() {
        assert!(is_empty_signal("HTTP 404"));
        assert!(is_empty_signal("Page Not Found"));
        assert!(is_empty_signal("Wait condition failed: selector never appeared"));
        assert!(is_empty_signal("Navigation TIMEOUT of 30000 ms exceeded"));
        assert!(is_empty_signal("content empty"));
        assert!(!is_empty_signal("net::ERR_CONNECTION_RESET"));
        assert!(!is_empty_signal(""));
    }

    #[test]
    fn test_timeout_classification() {
        let err = RenderError::Timeout {
            url: "https://tsanghi.com/fin/doc?index=2-1-1".to_string(),
        };
        assert!(err.is_timeout());

        let err = RenderError::Service {
            url: "u".to_string(),
            message: "boom".to_string(),
        };
        assert!(!err.is_timeout());
    }
}
