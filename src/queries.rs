//! Read-side queries over one category's report table.
//!
//! These back the dashboard (name list, daily chart series) and the
//! exports (differences and pivots).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Difference, Pivot, PivotRow, ReportRow, SeriesPoint};

// ---------------------------------------------------------------------------
// CategoryQuery
// ---------------------------------------------------------------------------

/// Query interface over the rows of a single category, in snapshot order.
pub struct CategoryQuery<'a> {
    rows: &'a [ReportRow],
}

impl<'a> CategoryQuery<'a> {
    /// Create a new `CategoryQuery` over rows sorted by snapshot.
    pub fn new(rows: &'a [ReportRow]) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &'a [ReportRow] {
        self.rows
    }

    /// Every distinct name seen in any snapshot.
    pub fn names(&self) -> BTreeSet<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    /// Observations of one name, in snapshot order.
    pub fn history(&self, name: &str) -> Vec<(NaiveDateTime, f64)> {
        self.rows
            .iter()
            .filter(|r| r.name == name)
            .map(|r| (r.snapshot, r.amount))
            .collect()
    }

    /// Daily mean of `name`'s amount, one point per calendar day from the
    /// first observation to the last. Days without data carry `None`.
    pub fn series(&self, name: &str) -> Vec<SeriesPoint> {
        let mut by_day: BTreeMap<NaiveDate, Mean> = BTreeMap::new();
        for (at, amount) in self.history(name) {
            by_day.entry(at.date()).or_default().push(amount);
        }

        let (Some(first), Some(last)) = (
            by_day.keys().next().copied(),
            by_day.keys().next_back().copied(),
        ) else {
            return Vec::new();
        };

        first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| SeriesPoint {
                day,
                amount: by_day.get(&day).map(Mean::value),
            })
            .collect()
    }

    /// Per name, the last amount minus the one before it.
    ///
    /// Names observed only once get `None`.
    pub fn differences(&self) -> Vec<Difference> {
        let mut by_name: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for row in self.rows {
            by_name.entry(row.name.as_str()).or_default().push(row.amount);
        }

        by_name
            .into_iter()
            .map(|(name, amounts)| {
                let amount_difference = match amounts.as_slice() {
                    [.., prev, last] => Some(last - prev),
                    _ => None,
                };
                Difference {
                    name: name.to_string(),
                    amount_difference,
                }
            })
            .collect()
    }

    /// Name × day table of mean amounts.
    pub fn daily_pivot(&self) -> Pivot {
        self.pivot(|at| at.format("%Y-%m-%d").to_string())
    }

    /// Name × month (`YYYY-MM`) table of mean amounts.
    pub fn monthly_pivot(&self) -> Pivot {
        self.pivot(|at| at.format("%Y-%m").to_string())
    }

    /// Group rows by name and by the period label `period` assigns to each
    /// snapshot, averaging within a cell. Labels must sort chronologically.
    fn pivot<F>(&self, period: F) -> Pivot
    where
        F: Fn(NaiveDateTime) -> String,
    {
        let mut cells: BTreeMap<&str, BTreeMap<String, Mean>> = BTreeMap::new();
        let mut columns: BTreeSet<String> = BTreeSet::new();

        for row in self.rows {
            let label = period(row.snapshot);
            columns.insert(label.clone());
            cells
                .entry(row.name.as_str())
                .or_default()
                .entry(label)
                .or_default()
                .push(row.amount);
        }

        let columns: Vec<String> = columns.into_iter().collect();
        let rows = cells
            .into_iter()
            .map(|(name, by_period)| PivotRow {
                name: name.to_string(),
                values: columns
                    .iter()
                    .map(|c| by_period.get(c).map(Mean::value))
                    .collect(),
            })
            .collect();

        Pivot { columns, rows }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        self.sum / self.count as f64
    }
}
