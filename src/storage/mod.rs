//! Storage module for persisting crawl artifacts
//!
//! This module handles everything written to the output directory:
//! - one snapshot file per successfully crawled page index
//! - write-once markers for page indices confirmed empty
//! - the consolidated results file consulted by `--resume`
//! - the post-run sweep removing empty or malformed artifacts
//!
//! Every write goes to a temporary file first and is renamed into place, so an
//! interrupted run never leaves a half-written artifact behind.

mod artifacts;
mod sweep;

pub use artifacts::{write_atomic, ArtifactStore, EmptyMarker, EMPTY_STATUS};
pub use sweep::{inspect_artifact, sweep, ArtifactVerdict, SweepReport};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing artifacts
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed artifact {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("Undecodable artifact {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
