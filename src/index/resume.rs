use crate::index::PageIndex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Reads the keys of the consolidated results file
///
/// A missing file means nothing has been completed yet. A file that cannot be
/// read or is not a JSON object is logged and treated the same way, so a
/// damaged results file costs a re-crawl instead of aborting the run.
pub fn load_completed_keys(results_file: &Path) -> HashSet<String> {
    if !results_file.exists() {
        tracing::debug!("No results file at {}", results_file.display());
        return HashSet::new();
    }

    let content = match std::fs::read_to_string(results_file) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", results_file.display(), e);
            return HashSet::new();
        }
    };

    match serde_json::from_str::<Map<String, Value>>(&content) {
        Ok(results) => {
            let keys: HashSet<String> = results.keys().cloned().collect();
            tracing::info!("Found {} completed indices", keys.len());
            keys
        }
        Err(e) => {
            tracing::error!(
                "Results file {} is not a JSON object: {}",
                results_file.display(),
                e
            );
            HashSet::new()
        }
    }
}

/// Returns the indices whose key is not in `completed`, in generation order
pub fn remaining_indices(all: &[PageIndex], completed: &HashSet<String>) -> Vec<PageIndex> {
    all.iter()
        .filter(|index| !completed.contains(&index.key()))
        .copied()
        .collect()
}
