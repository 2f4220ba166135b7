use crate::index::PageIndex;
use crate::normalizer::DocRecord;
use crate::storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// `status` value of an empty-page marker
pub const EMPTY_STATUS: &str = "empty";

/// Sentinel written for a page index confirmed to carry no documentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyMarker {
    pub index: PageIndex,
    pub status: String,
    /// Local time of the check, `%Y-%m-%d %H:%M:%S`
    pub checked_time: String,
}

impl EmptyMarker {
    pub fn now(index: PageIndex) -> Self {
        Self {
            index,
            status: EMPTY_STATUS.to_string(),
            checked_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Writes `bytes` to `path` through a sibling temporary file and a rename
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name));

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

/// Flat-file store of per-page artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the output directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, index: &PageIndex) -> PathBuf {
        self.dir.join(format!("doc_{}.json", index))
    }

    pub fn empty_marker_path(&self, index: &PageIndex) -> PathBuf {
        self.dir.join(format!("empty_{}.json", index))
    }

    /// Persists a record as a one-element JSON array
    pub fn write_record(&self, index: &PageIndex, record: &DocRecord) -> StorageResult<PathBuf> {
        let path = self.record_path(index);
        let json = serde_json::to_string_pretty(&[record])?;
        write_atomic(&path, json.as_bytes())?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Persists the empty-page marker of an index
    pub fn write_empty_marker(&self, index: &PageIndex) -> StorageResult<PathBuf> {
        let path = self.empty_marker_path(index);
        let json = serde_json::to_string(&EmptyMarker::now(*index))?;
        write_atomic(&path, json.as_bytes())?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Loads the record persisted for an index, if any
    pub fn load_record(&self, index: &PageIndex) -> StorageResult<Option<DocRecord>> {
        let path = self.record_path(index);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let records: Vec<DocRecord> =
            serde_json::from_str(&content).map_err(|e| StorageError::Decode {
                path: path.clone(),
                message: e.to_string(),
            })?;

        match records.into_iter().next() {
            Some(record) => Ok(Some(record)),
            None => Err(StorageError::MalformedArtifact {
                path,
                reason: "empty record array".to_string(),
            }),
        }
    }

    /// Merges records into the consolidated results file
    ///
    /// Keys already present are kept unless overwritten by `records`. Returns
    /// the number of keys in the file afterwards.
    pub fn merge_results(
        &self,
        file_name: &str,
        records: &BTreeMap<PageIndex, DocRecord>,
    ) -> StorageResult<usize> {
        let path = self.dir.join(file_name);
        let mut results = self.load_results(&path);

        for (index, record) in records {
            results.insert(index.key(), serde_json::to_value([record])?);
        }

        let json = serde_json::to_string_pretty(&results)?;
        write_atomic(&path, json.as_bytes())?;
        tracing::info!(
            "Results file {} now holds {} indices",
            path.display(),
            results.len()
        );
        Ok(results.len())
    }

    fn load_results(&self, path: &Path) -> Map<String, Value> {
        let Ok(content) = fs::read_to_string(path) else {
            return Map::new();
        };
        match serde_json::from_str(&content) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(
                    "Replacing unreadable results file {}: {}",
                    path.display(),
                    e
                );
                Map::new()
            }
        }
    }
}
