//! Output artifacts and publication
//!
//! A run's artifacts live under `<root>/runs/<run-id>/`:
//! - `capture.db`     — raw capture (pages + raw records)
//! - `locations.csv`  — the processed dataset
//! - `manifest.toml`  — counts, coverage, timestamps
//!
//! Nothing under `runs/` is visible to consumers until the `current.toml`
//! pointer at the root is atomically flipped; a failure at any earlier step
//! leaves the previous dataset published.

pub mod dataset_csv;
pub mod manifest;
pub mod stats;

pub use dataset_csv::{read_dataset, write_dataset, COLUMNS};
pub use manifest::{
    load_manifest, load_pointer, publish_pointer, write_manifest, CurrentPointer,
    ManifestCounts, ManifestCoverage, RunManifest, CURRENT_FILE,
};
pub use stats::print_report;

use crate::dataset::Dataset;
use crate::model::{PageKind, RawRecord, SourcePage};
use crate::storage::{CaptureSink, CaptureStore};
use crate::WriteError;
use chrono::Utc;
use std::path::{Path, PathBuf};

pub const RUNS_DIR: &str = "runs";
pub const DATASET_FILE: &str = "locations.csv";
pub const MANIFEST_FILE: &str = "manifest.toml";
pub const CAPTURE_FILE: &str = "capture.db";

/// Where a published run's artifacts ended up.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub run_dir: PathBuf,
    pub capture_path: PathBuf,
    pub dataset_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// Writes all run artifacts, then publishes the pointer.
///
/// Order matters: raw capture, processed dataset, manifest, pointer. The
/// pointer flip is the commit point — everything before it is invisible to
/// consumers, and a failure anywhere before it leaves the previously
/// published dataset current.
pub fn publish_run(
    root: &Path,
    run_manifest: &RunManifest,
    pages: &[(SourcePage, PageKind)],
    raw_records: &[RawRecord],
    dataset: &Dataset,
) -> Result<RunArtifacts, WriteError> {
    let run_dir = root.join(RUNS_DIR).join(&run_manifest.run_id);
    std::fs::create_dir_all(&run_dir).map_err(|e| WriteError::Io {
        path: run_dir.display().to_string(),
        source: e,
    })?;

    let capture_path = run_dir.join(CAPTURE_FILE);
    let dataset_path = run_dir.join(DATASET_FILE);
    let manifest_path = run_dir.join(MANIFEST_FILE);

    // 1. Raw capture
    let mut capture = CaptureStore::create(
        &capture_path,
        run_manifest.started_at,
        &run_manifest.config_hash,
    )?;
    for (page, kind) in pages {
        capture.record_page(page, kind)?;
    }
    for record in raw_records {
        capture.record_raw(record)?;
    }

    // 2. Processed dataset
    write_dataset(&dataset_path, dataset)?;

    // 3. Manifest
    write_manifest(&manifest_path, run_manifest)?;

    // 4. Pointer flip
    let rel = |path: &Path| {
        path.strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    };
    publish_pointer(
        root,
        &CurrentPointer {
            run_id: run_manifest.run_id.clone(),
            run_dir: rel(&run_dir),
            dataset: rel(&dataset_path),
            manifest: rel(&manifest_path),
            published_at: Utc::now(),
        },
    )?;

    tracing::info!(
        "Published dataset for run {} ({} locations)",
        run_manifest.run_id,
        dataset.len()
    );

    Ok(RunArtifacts {
        run_dir,
        capture_path,
        dataset_path,
        manifest_path,
    })
}

/// Loads the currently published dataset, if any.
pub fn load_current_dataset(root: &Path) -> Result<(Dataset, Option<CurrentPointer>), WriteError> {
    match load_pointer(root)? {
        None => Ok((Dataset::new(), None)),
        Some(pointer) => {
            let dataset = read_dataset(&root.join(&pointer.dataset))?;
            Ok((dataset, Some(pointer)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Contact, ServiceCategory, ServiceLocation};
    use chrono::Utc;

    fn sample_manifest(run_id: &str) -> RunManifest {
        RunManifest {
            run_id: run_id.to_string(),
            config_hash: "deadbeef".to_string(),
            outcome: "success".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            counts: ManifestCounts::default(),
            coverage: ManifestCoverage {
                pages: 1.0,
                records: 1.0,
            },
        }
    }

    fn sample_location(id: &str) -> ServiceLocation {
        ServiceLocation {
            id: id.to_string(),
            name: "Depot".to_string(),
            address: Address {
                raw: "1 Tip Rd, Sunshine VIC 3020".to_string(),
                street: Some("1 Tip Rd".to_string()),
                suburb: Some("Sunshine".to_string()),
                state: Some("VIC".to_string()),
                postcode: Some("3020".to_string()),
            },
            coordinates: None,
            categories: vec![ServiceCategory::GeneralWaste],
            contact: Contact::default(),
            hours: None,
            needs_review: false,
            source_url: "https://example.com/locations/depot/".to_string(),
            last_seen: Utc::now(),
        }
    }

    fn sample_page() -> (SourcePage, PageKind) {
        (
            SourcePage {
                url: "https://example.com/locations/?state=VIC".to_string(),
                final_url: "https://example.com/locations/?state=VIC".to_string(),
                status: 200,
                body: "<html></html>".to_string(),
                fetched_at: Utc::now(),
            },
            PageKind::Listing {
                region: "VIC".to_string(),
                page_no: 1,
            },
        )
    }

    #[test]
    fn test_publish_run_writes_everything() {
        let dir = tempfile::tempdir().unwrap();

        let mut dataset = Dataset::new();
        dataset.insert(sample_location("SVCa"));

        let artifacts = publish_run(
            dir.path(),
            &sample_manifest("run-1"),
            &[sample_page()],
            &[RawRecord::default()],
            &dataset,
        )
        .unwrap();

        assert!(artifacts.capture_path.exists());
        assert!(artifacts.dataset_path.exists());
        assert!(artifacts.manifest_path.exists());

        let (loaded, pointer) = load_current_dataset(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(pointer.unwrap().run_id, "run-1");
    }

    #[test]
    fn test_no_pointer_means_empty_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let (dataset, pointer) = load_current_dataset(dir.path()).unwrap();
        assert!(dataset.is_empty());
        assert!(pointer.is_none());
    }

    #[test]
    fn test_failure_before_dataset_write_leaves_pointer_untouched() {
        let dir = tempfile::tempdir().unwrap();

        // Publish a good run first
        let mut dataset = Dataset::new();
        dataset.insert(sample_location("SVCa"));
        publish_run(dir.path(), &sample_manifest("run-1"), &[], &[], &dataset).unwrap();

        // Sabotage the next run: its dataset path already exists as a
        // directory, so the write after the raw capture fails.
        let run2_dir = dir.path().join(RUNS_DIR).join("run-2");
        std::fs::create_dir_all(run2_dir.join(DATASET_FILE)).unwrap();

        let mut dataset2 = Dataset::new();
        dataset2.insert(sample_location("SVCb"));
        let result = publish_run(
            dir.path(),
            &sample_manifest("run-2"),
            &[sample_page()],
            &[],
            &dataset2,
        );
        assert!(result.is_err());

        // Raw capture was written, but the pointer still names run-1
        assert!(run2_dir.join(CAPTURE_FILE).exists());
        let pointer = load_pointer(dir.path()).unwrap().unwrap();
        assert_eq!(pointer.run_id, "run-1");

        let (loaded, _) = load_current_dataset(dir.path()).unwrap();
        assert!(loaded.get("SVCa").is_some());
        assert!(loaded.get("SVCb").is_none());
    }
}
