//! Report tables built from every stored cleaned snapshot.
//!
//! Loading is read-only and idempotent. A file that cannot be read or parsed
//! is skipped with a warning so one bad snapshot never blanks the report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Category, CleanedSnapshot, ReportRow};
use crate::queries::CategoryQuery;
use crate::store::{read_cleaned, SnapshotKind, SnapshotStore};

// ---------------------------------------------------------------------------
// ReportTables
// ---------------------------------------------------------------------------

/// One table of `(name, amount, snapshot)` rows per category.
///
/// Rows are kept sorted by snapshot, then name, then amount, so two loads of
/// the same files compare equal whatever order the files were found in.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTables {
    tables: BTreeMap<Category, Vec<ReportRow>>,
    files: usize,
}

impl Default for ReportTables {
    fn default() -> Self {
        Self {
            tables: Category::ALL.into_iter().map(|c| (c, Vec::new())).collect(),
            files: 0,
        }
    }
}

impl ReportTables {
    /// Build tables from already-parsed snapshots.
    pub fn from_snapshots<'a, I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = &'a CleanedSnapshot>,
    {
        let mut tables = Self::default();
        for snapshot in snapshots {
            tables.extend_from(snapshot);
        }
        tables.sort();
        tables
    }

    fn extend_from(&mut self, snapshot: &CleanedSnapshot) {
        for category in Category::ALL {
            let Some(records) = snapshot.category(category) else {
                continue;
            };
            let rows = self.tables.entry(category).or_default();
            rows.extend(records.iter().map(|(name, r)| ReportRow {
                name: name.clone(),
                amount: r.amount,
                snapshot: r.snapshot,
            }));
        }
        self.files += 1;
    }

    fn sort(&mut self) {
        for rows in self.tables.values_mut() {
            rows.sort_by(|a, b| {
                a.snapshot
                    .cmp(&b.snapshot)
                    .then_with(|| a.name.cmp(&b.name))
                    .then_with(|| a.amount.total_cmp(&b.amount))
            });
        }
    }

    /// Rows of one category; empty if no snapshot contained it.
    pub fn table(&self, category: Category) -> &[ReportRow] {
        self.tables.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tables(&self) -> impl Iterator<Item = (Category, &[ReportRow])> {
        self.tables.iter().map(|(c, rows)| (*c, rows.as_slice()))
    }

    /// Query interface over one category's rows.
    pub fn query(&self, category: Category) -> CategoryQuery<'_> {
        CategoryQuery::new(self.table(category))
    }

    /// Number of snapshot files that contributed rows.
    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }
}

/// Load every `cleaned_data_*.json` in `data_dir` into report tables.
///
/// A missing directory yields empty tables.
pub fn load_report_tables(data_dir: &Path) -> Result<ReportTables> {
    let files = SnapshotStore::new(data_dir).list(SnapshotKind::Cleaned)?;
    Ok(load_files(&files))
}

/// Load the given cleaned snapshot files, skipping unreadable ones.
pub fn load_files(files: &[PathBuf]) -> ReportTables {
    let mut tables = ReportTables::default();
    for path in files {
        match read_cleaned(path) {
            Ok(snapshot) => {
                debug!(path = %path.display(), records = snapshot.record_count(), "loaded snapshot");
                tables.extend_from(&snapshot);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
            }
        }
    }
    tables.sort();
    tables
}

// ---------------------------------------------------------------------------
// ReportCache
// ---------------------------------------------------------------------------

/// Process-wide report tables with an explicit reload.
///
/// `reload()` builds the new tables completely before swapping them in, so a
/// reader holding the previous `Arc` keeps a consistent view.
pub struct ReportCache {
    data_dir: PathBuf,
    current: RwLock<Arc<ReportTables>>,
}

impl ReportCache {
    /// Create a cache and perform the initial load.
    pub fn load(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let tables = load_report_tables(&data_dir)?;
        Ok(Self {
            data_dir,
            current: RwLock::new(Arc::new(tables)),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The tables as of the last successful load.
    pub fn current(&self) -> Arc<ReportTables> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-scan the data directory and replace the cached tables.
    ///
    /// On error the previous tables stay in place.
    pub fn reload(&self) -> Result<Arc<ReportTables>> {
        let fresh = Arc::new(load_report_tables(&self.data_dir)?);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&fresh);
        debug!(files = fresh.file_count(), "report tables reloaded");
        Ok(fresh)
    }
}
