//! Boundary facade over the dataset store and the query pipeline.
//!
//! [`ClimateService`] is what callers (the CLI, or any embedding host) talk
//! to: it loads datasets, lists variables and answers point and timeline
//! queries against the current snapshot. Reloads can run synchronously or on
//! tokio's blocking pool through [`ClimateService::reload_path`], which
//! returns a cancellable [`ReloadHandle`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use climate_core::error::{ClimateError, Result};
use climate_core::models::{
    LoadSummary, QueryResult, SubsetConfig, SubsetQuery, TimelinePoint, TimelineRequest,
    VariableDescriptor,
};
use climate_core::variables::describe;
use climate_data::analysis::{run_query, StatsRequest};
use climate_data::reader::CancelFlag;
use climate_data::statistics::StatisticsEngine;
use climate_data::timeline::generate_timeline;
use tokio::task::JoinHandle;

use crate::dataset_store::DatasetStore;

// ── ClimateService ────────────────────────────────────────────────────────────

/// Loads climate observations and answers statistics queries over them.
///
/// Queries never block on a reload: each one works on the snapshot that was
/// active when it started.
#[derive(Debug, Clone)]
pub struct ClimateService {
    store: Arc<DatasetStore>,
    config: SubsetConfig,
    engine: StatisticsEngine,
}

impl ClimateService {
    /// Service with an empty dataset and the given subset tuning.
    pub fn new(config: SubsetConfig) -> Self {
        Self::with_engine(config, StatisticsEngine::new())
    }

    /// Service using a specific statistics engine (e.g. a fixed current year).
    pub fn with_engine(config: SubsetConfig, engine: StatisticsEngine) -> Self {
        Self {
            store: Arc::new(DatasetStore::new()),
            config,
            engine,
        }
    }

    pub fn config(&self) -> &SubsetConfig {
        &self.config
    }

    /// The underlying store, shared with any in-flight reloads.
    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Load the file at `path`, replacing the active dataset on success.
    pub fn load_path(&self, path: &Path) -> Result<LoadSummary> {
        self.store.load_path(path, &CancelFlag::new())
    }

    /// Load from any byte stream, replacing the active dataset on success.
    pub fn load_reader<R: Read>(&self, source: R) -> Result<LoadSummary> {
        self.store.load_reader(source, &CancelFlag::new())
    }

    /// Start loading `path` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn reload_path(&self, path: PathBuf) -> ReloadHandle {
        let store = Arc::clone(&self.store);
        ReloadHandle::spawn(move |cancel| store.load_path(&path, &cancel))
    }

    /// Start loading `source` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn reload_reader<R>(&self, source: R) -> ReloadHandle
    where
        R: Read + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        ReloadHandle::spawn(move |cancel| store.load_reader(source, &cancel))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Describe every variable discovered in the active dataset, by key.
    pub fn list_variables(&self) -> Vec<VariableDescriptor> {
        self.store
            .snapshot()
            .variables()
            .iter()
            .map(|key| describe(key))
            .collect()
    }

    /// Statistics for `stats.variables` over the subset selected by `query`.
    pub fn query(&self, query: &SubsetQuery, stats: &StatsRequest) -> QueryResult {
        let dataset = self.store.snapshot();
        run_query(&dataset, query, stats, &self.config, &self.engine)
    }

    /// One [`QueryResult`] per step of `request`, sharing `base`'s location.
    pub fn timeline_query(
        &self,
        base: &SubsetQuery,
        stats: &StatsRequest,
        request: &TimelineRequest,
    ) -> Result<Vec<TimelinePoint>> {
        let dataset = self.store.snapshot();
        generate_timeline(&dataset, base, request, stats, &self.config, &self.engine)
    }
}

// ── ReloadHandle ──────────────────────────────────────────────────────────────

/// A background load running on tokio's blocking pool.
///
/// Dropping the handle detaches the load; it still publishes on success.
/// Call [`ReloadHandle::cancel`] to abandon it instead.
#[derive(Debug)]
pub struct ReloadHandle {
    cancel: CancelFlag,
    handle: JoinHandle<Result<LoadSummary>>,
}

impl ReloadHandle {
    fn spawn<F>(load: F) -> Self
    where
        F: FnOnce(CancelFlag) -> Result<LoadSummary> + Send + 'static,
    {
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || load(flag));
        Self { cancel, handle }
    }

    /// Ask the load to stop at the next row or read.
    ///
    /// The active dataset is kept unless the load had already published
    /// before the flag was raised.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the flag [`ReloadHandle::cancel`] raises, for use after
    /// the handle has been consumed by [`ReloadHandle::wait`].
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// `true` once the load has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the load to finish and return its summary.
    pub async fn wait(self) -> Result<LoadSummary> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClimateError::Cancelled),
            Err(e) => Err(ClimateError::Other(anyhow::anyhow!("reload task failed: {e}"))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
