use crate::normalizer::DocRecord;
use crate::storage::{StorageResult, EMPTY_STATUS};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// What the sweep decides for one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactVerdict {
    /// A record with content, or a well-formed empty marker
    Keep,
    /// A record array with no usable content
    RemoveEmpty,
    /// Valid JSON of the wrong shape
    RemoveMalformed(String),
    /// Not valid JSON
    RemoveUndecodable(String),
}

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub kept: usize,
    /// Temporary files left behind by an interrupted write
    pub stale_temps: usize,
}

/// Decides whether an artifact's content is worth keeping
pub fn inspect_artifact(content: &str) -> ArtifactVerdict {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => return ArtifactVerdict::RemoveUndecodable(e.to_string()),
    };

    match value {
        Value::Array(items) => {
            let Some(first) = items.into_iter().next() else {
                return ArtifactVerdict::RemoveEmpty;
            };
            if !first.is_object() {
                return ArtifactVerdict::RemoveMalformed("record is not an object".to_string());
            }
            match serde_json::from_value::<DocRecord>(first) {
                Ok(record) if record.is_empty() => ArtifactVerdict::RemoveEmpty,
                Ok(_) => ArtifactVerdict::Keep,
                Err(e) => ArtifactVerdict::RemoveMalformed(e.to_string()),
            }
        }
        Value::Object(map) => {
            let is_marker = map.get("status").and_then(Value::as_str) == Some(EMPTY_STATUS)
                && map.contains_key("index");
            if is_marker {
                ArtifactVerdict::Keep
            } else {
                ArtifactVerdict::RemoveMalformed("object is not an empty marker".to_string())
            }
        }
        _ => ArtifactVerdict::RemoveMalformed("unexpected JSON value".to_string()),
    }
}

/// Removes empty and malformed artifacts from `dir`
///
/// The consolidated results file is never touched. Running the sweep twice
/// removes nothing the second time.
pub fn sweep(dir: &Path, results_file: &str) -> StorageResult<SweepReport> {
    let mut report = SweepReport::default();

    if !dir.exists() {
        tracing::debug!("Nothing to sweep, {} does not exist", dir.display());
        return Ok(report);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".tmp") {
            if remove(&path)? {
                report.stale_temps += 1;
            }
            continue;
        }
        if !name.ends_with(".json") || name == results_file {
            continue;
        }

        let content = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        match inspect_artifact(&content) {
            ArtifactVerdict::Keep => report.kept += 1,
            verdict => {
                match &verdict {
                    ArtifactVerdict::RemoveEmpty => {
                        tracing::info!("Removing empty artifact {}", name)
                    }
                    ArtifactVerdict::RemoveMalformed(reason)
                    | ArtifactVerdict::RemoveUndecodable(reason) => {
                        tracing::warn!("Removing unusable artifact {}: {}", name, reason)
                    }
                    ArtifactVerdict::Keep => {}
                }
                if remove(&path)? {
                    report.removed += 1;
                }
            }
        }
    }

    tracing::info!(
        "Sweep of {} removed {} artifacts, kept {}",
        dir.display(),
        report.removed,
        report.kept
    );
    Ok(report)
}

/// Deletes a file, treating an already-missing file as done
fn remove(path: &Path) -> StorageResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
