//! Owner of the active dataset.
//!
//! [`DatasetStore`] hands out immutable [`Arc<Dataset>`] snapshots to
//! queries and replaces the active dataset with a single pointer swap once a
//! new one has been fully ingested. A failed or cancelled ingestion leaves
//! the previous dataset in place and records the error for later inspection.

use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use climate_core::error::{ClimateError, Result};
use climate_core::models::{Dataset, LoadSummary};
use climate_data::reader::{load_dataset, read_dataset, CancelFlag, Ingested};

// ── DatasetStore ──────────────────────────────────────────────────────────────

/// Replace-on-success holder of the active [`Dataset`].
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use climate_data::reader::CancelFlag;
/// use climate_runtime::dataset_store::DatasetStore;
///
/// let store = DatasetStore::new();
/// let summary = store.load_path(Path::new("observations.csv"), &CancelFlag::new())?;
/// println!("{} rows kept", summary.rows_kept);
/// let snapshot = store.snapshot();
/// # Ok::<(), climate_core::ClimateError>(())
/// ```
#[derive(Debug)]
pub struct DatasetStore {
    /// Published dataset and the reports that go with it, swapped together.
    active: RwLock<Published>,
}

/// Everything a reader may observe about the store at one instant.
#[derive(Debug)]
struct Published {
    dataset: Arc<Dataset>,
    /// Report of the load that produced `dataset`; `None` for a dataset
    /// installed through [`DatasetStore::replace`] or the initial one.
    summary: Option<LoadSummary>,
    /// Description of the most recent failed load, cleared on success.
    last_error: Option<String>,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStore {
    /// Store holding an empty dataset.
    pub fn new() -> Self {
        Self::with_dataset(Dataset::empty())
    }

    /// Store pre-populated with `dataset`.
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            active: RwLock::new(Published {
                dataset: Arc::new(dataset),
                summary: None,
                last_error: None,
            }),
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// The currently published dataset.
    ///
    /// The returned snapshot stays valid and unchanged for as long as the
    /// caller holds it, even across a concurrent replace.
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.read().dataset)
    }

    /// The published dataset together with the report of the load that
    /// produced it, read in one step.
    pub fn snapshot_with_summary(&self) -> (Arc<Dataset>, Option<LoadSummary>) {
        let published = self.read();
        (Arc::clone(&published.dataset), published.summary.clone())
    }

    /// Report of the load behind the published dataset, if any.
    pub fn last_summary(&self) -> Option<LoadSummary> {
        self.read().summary.clone()
    }

    /// Description of the last failed load, or `None` after a success.
    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Publish `dataset` without a load report, returning the one it
    /// replaced.
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let mut published = self.write();
        published.summary = None;
        std::mem::replace(&mut published.dataset, Arc::new(dataset))
    }

    /// Ingest the file at `path` and publish it on success.
    pub fn load_path(&self, path: &Path, cancel: &CancelFlag) -> Result<LoadSummary> {
        self.publish(load_dataset(path, cancel), cancel)
    }

    /// Ingest `source` and publish it on success.
    pub fn load_reader<R: Read>(&self, source: R, cancel: &CancelFlag) -> Result<LoadSummary> {
        self.publish(read_dataset(source, cancel), cancel)
    }

    // ── Private helpers ───────────────────────────────────────────────────

    // The guarded value is replaced wholesale, so a poisoned lock still holds
    // a consistent state.
    fn read(&self) -> RwLockReadGuard<'_, Published> {
        self.active.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Published> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, ingested: Result<Ingested>, cancel: &CancelFlag) -> Result<LoadSummary> {
        let mut published = self.write();
        // Checked under the write lock: once cancelled, nothing is swapped in.
        let ingested = ingested.and_then(|ing| {
            if cancel.is_cancelled() {
                Err(ClimateError::Cancelled)
            } else {
                Ok(ing)
            }
        });

        match ingested {
            Ok(Ingested { dataset, summary }) => {
                let next = Published {
                    dataset: Arc::new(dataset),
                    summary: Some(summary.clone()),
                    last_error: None,
                };
                let previous = std::mem::replace(&mut *published, next);
                tracing::debug!(
                    previous_rows = previous.dataset.len(),
                    rows = summary.rows_kept,
                    "active dataset replaced"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(error = %e, "load failed; keeping previous dataset");
                published.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
