//! Run manifest and the current-dataset pointer
//!
//! Every run writes a manifest (counts, coverage, timestamps, config hash)
//! next to its artifacts. Publication is a pointer flip: `current.toml` at
//! the output root is rewritten via a temp file and an atomic rename, so a
//! consumer reading the pointer path can never observe a half-written
//! dataset, and a run that dies mid-write leaves the previous pointer
//! intact.

use crate::WriteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the pointer file at the output root.
pub const CURRENT_FILE: &str = "current.toml";

/// Record counts for one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ManifestCounts {
    pub listing_pages_attempted: u64,
    pub listing_pages_failed: u64,
    pub zero_yield_pages: u64,
    pub detail_pages_attempted: u64,
    pub detail_pages_failed: u64,
    pub records_extracted: u64,
    pub parse_errors: u64,
    pub records_validated: u64,
    pub records_rejected: u64,
    pub id_collisions: u64,
    pub dataset_size: u64,
    pub added: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub retained: u64,
    pub purged: u64,
}

/// Coverage ratios for one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ManifestCoverage {
    /// Fetched pages over attempted pages.
    pub pages: f64,
    /// Validated records over extracted records.
    pub records: f64,
}

/// Everything a consumer or the next run needs to know about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub config_hash: String,
    /// "success" or "partial".
    pub outcome: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: ManifestCounts,
    pub coverage: ManifestCoverage,
}

/// The published pointer: which run is current and where its files are,
/// as paths relative to the output root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPointer {
    pub run_id: String,
    pub run_dir: String,
    pub dataset: String,
    pub manifest: String,
    pub published_at: DateTime<Utc>,
}

/// Writes a manifest file.
pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<(), WriteError> {
    let encoded = toml::to_string_pretty(manifest)?;
    std::fs::write(path, encoded).map_err(|e| io_error(path, e))
}

/// Loads a manifest file.
pub fn load_manifest(path: &Path) -> Result<RunManifest, WriteError> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    toml::from_str(&content).map_err(|e| WriteError::PreviousDataset {
        path: path.display().to_string(),
        reason: format!("bad manifest: {}", e),
    })
}

/// Atomically replaces the current-dataset pointer.
///
/// The pointer is written to a temp file in the same directory first;
/// `rename` within one filesystem either fully replaces the old pointer or
/// leaves it untouched.
pub fn publish_pointer(root: &Path, pointer: &CurrentPointer) -> Result<(), WriteError> {
    let target = root.join(CURRENT_FILE);
    let temp = root.join(format!("{}.tmp", CURRENT_FILE));

    let encoded = toml::to_string_pretty(pointer)?;
    std::fs::write(&temp, encoded).map_err(|e| io_error(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| io_error(&target, e))?;
    Ok(())
}

/// Loads the current pointer, if a dataset has ever been published here.
pub fn load_pointer(root: &Path) -> Result<Option<CurrentPointer>, WriteError> {
    let path = root.join(CURRENT_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
    let pointer = toml::from_str(&content).map_err(|e| WriteError::PreviousDataset {
        path: path.display().to_string(),
        reason: format!("bad pointer: {}", e),
    })?;
    Ok(Some(pointer))
}

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> RunManifest {
        RunManifest {
            run_id: "20260807T033000.000Z".to_string(),
            config_hash: "deadbeef".to_string(),
            outcome: "success".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            counts: ManifestCounts {
                listing_pages_attempted: 3,
                records_extracted: 12,
                records_validated: 12,
                dataset_size: 12,
                added: 12,
                ..ManifestCounts::default()
            },
            coverage: ManifestCoverage {
                pages: 1.0,
                records: 1.0,
            },
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.toml");

        let manifest = sample_manifest();
        write_manifest(&path, &manifest).unwrap();
        let loaded = load_manifest(&path).unwrap();

        assert_eq!(loaded.run_id, manifest.run_id);
        assert_eq!(loaded.outcome, "success");
        assert_eq!(loaded.counts.records_validated, 12);
        assert!((loaded.coverage.pages - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pointer_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_pointer(dir.path()).unwrap().is_none());

        let pointer = CurrentPointer {
            run_id: "r1".to_string(),
            run_dir: "runs/r1".to_string(),
            dataset: "runs/r1/locations.csv".to_string(),
            manifest: "runs/r1/manifest.toml".to_string(),
            published_at: Utc::now(),
        };
        publish_pointer(dir.path(), &pointer).unwrap();

        let loaded = load_pointer(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.run_id, "r1");
        assert_eq!(loaded.dataset, "runs/r1/locations.csv");
    }

    #[test]
    fn test_publish_replaces_previous_pointer() {
        let dir = tempfile::tempdir().unwrap();

        for run in ["r1", "r2"] {
            let pointer = CurrentPointer {
                run_id: run.to_string(),
                run_dir: format!("runs/{}", run),
                dataset: format!("runs/{}/locations.csv", run),
                manifest: format!("runs/{}/manifest.toml", run),
                published_at: Utc::now(),
            };
            publish_pointer(dir.path(), &pointer).unwrap();
        }

        let loaded = load_pointer(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.run_id, "r2");

        // No temp file left behind
        assert!(!dir.path().join("current.toml.tmp").exists());
    }

    #[test]
    fn test_corrupt_pointer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CURRENT_FILE), "not valid toml [[").unwrap();
        assert!(load_pointer(dir.path()).is_err());
    }
}
