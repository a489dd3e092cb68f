use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::snapshot_time;

// ---------------------------------------------------------------------------
// ReportRow - One (name, amount, snapshot) tuple of a report table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    pub amount: f64,
    #[serde(with = "snapshot_time")]
    pub snapshot: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// SeriesPoint - Daily-mean chart point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub day: NaiveDate,
    /// `None` for days inside the range with no observation.
    pub amount: Option<f64>,
}

// ---------------------------------------------------------------------------
// Difference - Change between a name's last two snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    pub name: String,
    pub amount_difference: Option<f64>,
}

// ---------------------------------------------------------------------------
// Pivot - name × period table of mean amounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// Period labels, ascending.
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub name: String,
    /// One cell per entry of [`Pivot::columns`].
    pub values: Vec<Option<f64>>,
}

impl Pivot {
    pub fn row(&self, name: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn cell(&self, name: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.row(name)?.values.get(idx).copied().flatten()
    }
}
