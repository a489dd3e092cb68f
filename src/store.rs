//! Append-only snapshot files in a flat data directory.
//!
//! Every write lands in a temp file inside the data directory first and is
//! renamed into place only once fully written, so readers never observe a
//! truncated document and a failed write leaves earlier files untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDateTime;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config;
use crate::error::{HiveStatsError, Result};
use crate::models::CleanedSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Raw,
    Cleaned,
}

impl SnapshotKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SnapshotKind::Raw => config::RAW_PREFIX,
            SnapshotKind::Cleaned => config::CLEANED_PREFIX,
        }
    }

    /// `<kind>_<mon>_<YYYY-MM-DD_HH-MM-SS>.json`
    pub fn file_name(self, at: NaiveDateTime) -> String {
        format!(
            "{}_{}_{}.json",
            self.prefix(),
            at.format("%b").to_string().to_lowercase(),
            at.format("%Y-%m-%d_%H-%M-%S")
        )
    }

    fn matches(self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.prefix())
            .is_some_and(|rest| rest.starts_with('_') && rest.ends_with(".json"))
    }
}

/// Writes and locates snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
    dir_mode: Option<u32>,
}

impl SnapshotStore {
    /// A store rooted at `data_dir`. The directory is created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            dir_mode: Some(config::DATA_DIR_MODE),
        }
    }

    /// Mode applied to the data directory before each write (Unix only).
    /// `None` leaves permissions alone.
    pub fn with_dir_mode(mut self, mode: Option<u32>) -> Self {
        self.dir_mode = mode;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Serialize `document` as a new `kind` snapshot stamped `at`.
    ///
    /// Never overwrites: a file with the same name already present is a
    /// store error.
    pub fn store<T>(&self, document: &T, kind: SnapshotKind, at: NaiveDateTime) -> Result<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        let path = self.data_dir.join(kind.file_name(at));
        let bytes = serde_json::to_vec(document).map_err(|e| HiveStatsError::Store {
            path: path.clone(),
            source: e.into(),
        })?;

        self.prepare_dir().map_err(|source| HiveStatsError::Store {
            path: self.data_dir.clone(),
            source,
        })?;

        self.write_atomic(&path, &bytes)
            .map_err(|source| HiveStatsError::Store {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
        Ok(path)
    }

    fn prepare_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        if let Some(mode) = self.dir_mode {
            if let Err(e) = set_mode(&self.data_dir, mode) {
                warn!(
                    dir = %self.data_dir.display(),
                    error = %e,
                    "could not set data directory permissions"
                );
            }
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        // Dropping the temp file on any early return deletes it.
        let mut tmp = NamedTempFile::new_in(&self.data_dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        set_mode(tmp.path(), config::SNAPSHOT_FILE_MODE)?;
        tmp.persist_noclobber(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// All `kind` snapshot files, sorted by file name.
    ///
    /// A missing data directory yields an empty list.
    pub fn list(&self, kind: SnapshotKind) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Symlinked snapshots count; directories never do.
            if kind.matches(name) && !entry.file_type()?.is_dir() {
                files.push(entry.path());
            }
        }
        files.sort();
        debug!(kind = kind.prefix(), count = files.len(), "listed snapshot files");
        Ok(files)
    }

    /// Most recently modified `kind` snapshot; file name breaks ties.
    ///
    /// Files that vanish between listing and inspection are ignored.
    pub fn latest(&self, kind: SnapshotKind) -> Result<Option<PathBuf>> {
        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for path in self.list(kind)? {
            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "snapshot disappeared; ignoring");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let newer = match &latest {
                None => true,
                Some((t, p)) => (modified, &path) > (*t, p),
            };
            if newer {
                latest = Some((modified, path));
            }
        }
        Ok(latest.map(|(_, p)| p))
    }

    /// Timestamp embedded in the latest cleaned snapshot.
    ///
    /// `Ok(None)` when there is no cleaned file or the latest one holds no
    /// records.
    pub fn latest_snapshot_time(&self) -> Result<Option<NaiveDateTime>> {
        match self.latest(SnapshotKind::Cleaned)? {
            Some(path) => Ok(read_cleaned(&path)?.timestamp()),
            None => Ok(None),
        }
    }
}

/// Read and parse one cleaned snapshot file.
///
/// Any content problem, invalid UTF-8 included, is a parse error.
pub fn read_cleaned(path: &Path) -> Result<CleanedSnapshot> {
    let contents = fs::read(path)?;
    serde_json::from_slice(&contents).map_err(|source| HiveStatsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let current = fs::metadata(path)?.permissions().mode() & 0o777;
    if current != mode {
        debug!(
            path = %path.display(),
            from = %format!("{:o}", current),
            to = %format!("{:o}", mode),
            "setting permissions"
        );
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
