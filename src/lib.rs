//! Hive OS pool statistics tracker.
//!
//! Polls the Hive OS stats API, normalizes each response into a cleaned
//! snapshot, and stores both the raw and cleaned documents as timestamped
//! JSON files in a flat data directory. Stored snapshots are loaded back into
//! per-category report tables for charting and spreadsheet exports.
//!
//! # Quick start
//!
//! ```no_run
//! use hivestats::{Category, HiveStats};
//!
//! let stats = HiveStats::builder().data_dir("data").build().unwrap();
//!
//! // Take a snapshot if the latest one is more than a day old
//! let outcome = stats.snapshot(false);
//!
//! // Reload and chart one coin
//! stats.reload().unwrap();
//! let series = stats.series(Category::Coins, "ETC");
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod queries;
pub mod report;
pub mod scheduler;
pub mod store;

pub use aggregate::Aggregator;
pub use error::{HiveStatsError, Result};
pub use export::{ExportReport, Exporter};
pub use fetch::{HttpFetcher, SnapshotSource};
pub use models::Category;
pub use normalize::{normalize, Normalizer};
pub use queries::CategoryQuery;
pub use report::{load_report_tables, ReportCache, ReportTables};
pub use scheduler::{CycleReport, Scheduler, SchedulerHandle, SchedulerState, TickOutcome};
pub use store::{SnapshotKind, SnapshotStore};

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::models::SeriesPoint;

// ---------------------------------------------------------------------------
// HiveStatsBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`HiveStats`] instance.
pub struct HiveStatsBuilder {
    data_dir: Option<PathBuf>,
    endpoint: String,
    timeout: Duration,
    denylist: Vec<String>,
    staleness: Duration,
    interval: Duration,
    dir_mode: Option<u32>,
    source: Option<Arc<dyn SnapshotSource>>,
}

impl Default for HiveStatsBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            endpoint: config::STATS_URL.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
            denylist: config::default_denylist(),
            staleness: config::DEFAULT_STALENESS,
            interval: config::DEFAULT_TICK_INTERVAL,
            dir_mode: Some(config::DATA_DIR_MODE),
            source: None,
        }
    }
}

impl HiveStatsBuilder {
    /// Set the snapshot directory.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/hivestats` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Stats endpoint for the built-in HTTP fetcher.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// HTTP request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the denylist of canonical names.
    pub fn denylist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Age past which the latest snapshot is refreshed. Defaults to 24 hours.
    pub fn staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    /// Scheduler tick interval. Defaults to one hour.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Mode applied to the data directory before writes; `None` to leave it.
    pub fn dir_mode(mut self, mode: Option<u32>) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Use a custom payload source instead of the HTTP fetcher.
    pub fn source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the tracker and load existing report tables.
    pub fn build(self) -> Result<HiveStats> {
        let data_dir = self.data_dir.unwrap_or_else(config::default_data_dir);
        let source: Arc<dyn SnapshotSource> = match self.source {
            Some(source) => source,
            None => Arc::new(HttpFetcher::new(self.endpoint, self.timeout)),
        };

        let store = SnapshotStore::new(&data_dir).with_dir_mode(self.dir_mode);
        let aggregator = Aggregator::new(Normalizer::new(&self.denylist));
        let scheduler = Scheduler::new(source, aggregator, store)
            .with_interval(self.interval)
            .with_staleness(self.staleness);
        let reports = ReportCache::load(&data_dir)?;

        Ok(HiveStats {
            scheduler: Arc::new(scheduler),
            reports,
        })
    }
}

// ---------------------------------------------------------------------------
// HiveStats
// ---------------------------------------------------------------------------

/// The main entry point: owns the scheduler and the report cache.
///
/// Created via [`HiveStats::builder()`].
pub struct HiveStats {
    scheduler: Arc<Scheduler>,
    reports: ReportCache,
}

impl HiveStats {
    pub fn builder() -> HiveStatsBuilder {
        HiveStatsBuilder::default()
    }

    pub fn data_dir(&self) -> &Path {
        self.reports.data_dir()
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Run one cycle now. Unless `force` is set the staleness check applies.
    ///
    /// This blocks on the network; from async code use
    /// `tokio::task::spawn_blocking`.
    pub fn snapshot(&self, force: bool) -> TickOutcome {
        let now = Local::now().naive_local();
        if force {
            self.scheduler.run_cycle(now)
        } else {
            self.scheduler.tick(now)
        }
    }

    /// Spawn the periodic scheduler on the current tokio runtime.
    pub fn start(&self) -> SchedulerHandle {
        Arc::clone(&self.scheduler).start()
    }

    // -- Reporting ---------------------------------------------------------

    /// Report tables as of the last load or reload.
    pub fn reports(&self) -> Arc<ReportTables> {
        self.reports.current()
    }

    /// Re-scan the data directory and swap in fresh report tables.
    pub fn reload(&self) -> Result<Arc<ReportTables>> {
        self.reports.reload()
    }

    /// Every name seen in `category`.
    pub fn names(&self, category: Category) -> BTreeSet<String> {
        self.reports().query(category).names()
    }

    /// Daily-mean series of `name` in `category`.
    pub fn series(&self, category: Category, name: &str) -> Vec<SeriesPoint> {
        self.reports().query(category).series(name)
    }

    /// Write all four export artifacts under `out_dir`.
    pub fn export<P: AsRef<Path>>(&self, out_dir: P) -> Result<ExportReport> {
        Exporter::new(out_dir.as_ref()).export_all(&self.reports())
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for HiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reports = self.reports();
        write!(
            f,
            "HiveStats(data_dir={}, snapshots={}, interval={:?})",
            self.data_dir().display(),
            reports.file_count(),
            self.scheduler.interval()
        )
    }
}
