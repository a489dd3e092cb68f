//! Spreadsheet-style exports of the report tables.
//!
//! Each export is a directory holding one CSV sheet per category:
//!
//! | directory              | columns                         |
//! |------------------------|---------------------------------|
//! | `snapshot_output`      | `name, amount, snapshot`        |
//! | `differences_output`   | `name, amount_difference`       |
//! | `pivot_daily_output`   | `name, <YYYY-MM-DD>...`         |
//! | `pivot_monthly_output` | `name, <YYYY-MM>...`            |

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config;
use crate::error::Result;
use crate::models::{Category, Pivot, SNAPSHOT_FORMAT};
use crate::report::ReportTables;

/// Artifact directories written by [`Exporter::export_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub snapshot: PathBuf,
    pub differences: PathBuf,
    pub daily_pivot: PathBuf,
    pub monthly_pivot: PathBuf,
}

pub struct Exporter {
    out_dir: PathBuf,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Sheet path for `category` inside an artifact directory.
    pub fn sheet_path(artifact: &Path, category: Category) -> PathBuf {
        artifact.join(format!("{}.csv", category.as_str()))
    }

    pub fn export_all(&self, tables: &ReportTables) -> Result<ExportReport> {
        Ok(ExportReport {
            snapshot: self.export_snapshot(tables)?,
            differences: self.export_differences(tables)?,
            daily_pivot: self.export_daily_pivot(tables)?,
            monthly_pivot: self.export_monthly_pivot(tables)?,
        })
    }

    /// Every row of every category.
    pub fn export_snapshot(&self, tables: &ReportTables) -> Result<PathBuf> {
        let dir = self.artifact_dir(config::SNAPSHOT_EXPORT)?;
        for (category, rows) in tables.tables() {
            let mut wtr = csv::Writer::from_path(Self::sheet_path(&dir, category))?;
            wtr.write_record(["name", "amount", "snapshot"])?;
            for row in rows {
                wtr.write_record([
                    &row.name,
                    &row.amount.to_string(),
                    &row.snapshot.format(SNAPSHOT_FORMAT).to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        info!(dir = %dir.display(), "snapshot export written");
        Ok(dir)
    }

    /// Last-two-snapshot difference per name.
    pub fn export_differences(&self, tables: &ReportTables) -> Result<PathBuf> {
        let dir = self.artifact_dir(config::DIFFERENCES_EXPORT)?;
        for (category, _) in tables.tables() {
            let mut wtr = csv::Writer::from_path(Self::sheet_path(&dir, category))?;
            wtr.write_record(["name", "amount_difference"])?;
            for diff in tables.query(category).differences() {
                wtr.write_record([&diff.name, &cell(diff.amount_difference)])?;
            }
            wtr.flush()?;
        }
        info!(dir = %dir.display(), "differences export written");
        Ok(dir)
    }

    pub fn export_daily_pivot(&self, tables: &ReportTables) -> Result<PathBuf> {
        let dir = self.artifact_dir(config::DAILY_PIVOT_EXPORT)?;
        for (category, _) in tables.tables() {
            write_pivot(&Self::sheet_path(&dir, category), &tables.query(category).daily_pivot())?;
        }
        info!(dir = %dir.display(), "daily pivot export written");
        Ok(dir)
    }

    pub fn export_monthly_pivot(&self, tables: &ReportTables) -> Result<PathBuf> {
        let dir = self.artifact_dir(config::MONTHLY_PIVOT_EXPORT)?;
        for (category, _) in tables.tables() {
            write_pivot(&Self::sheet_path(&dir, category), &tables.query(category).monthly_pivot())?;
        }
        info!(dir = %dir.display(), "monthly pivot export written");
        Ok(dir)
    }

    fn artifact_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.out_dir.join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn write_pivot(path: &Path, pivot: &Pivot) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["name"];
    header.extend(pivot.columns.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for row in &pivot.rows {
        let mut record = vec![row.name.clone()];
        record.extend(row.values.iter().map(|v| cell(*v)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
