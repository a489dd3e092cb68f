use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HiveStatsError, Result};
use crate::models::Category;

/// Second-precision timestamp format embedded in every normalized record.
pub const SNAPSHOT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde adapter for `NaiveDateTime` in [`SNAPSHOT_FORMAT`].
pub mod snapshot_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::SNAPSHOT_FORMAT;

    pub fn serialize<S: Serializer>(at: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&at.format(SNAPSHOT_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, SNAPSHOT_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RawEntry / RawPayload - Stats API response
// ---------------------------------------------------------------------------

/// One `{name, amount}` item as returned by the API. `amount` is a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub name: String,
    pub amount: f64,
}

/// Top-level API object: category key -> entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(pub BTreeMap<String, Vec<RawEntry>>);

impl RawPayload {
    /// Validate a decoded response body against the expected shape.
    pub fn from_value(body: &Value) -> Result<Self> {
        if !body.is_object() {
            return Err(HiveStatsError::Payload(
                "expected a JSON object at the top level".into(),
            ));
        }
        RawPayload::deserialize(body).map_err(|e| HiveStatsError::Payload(e.to_string()))
    }

    pub fn entries(&self, key: &str) -> &[RawEntry] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Result of one successful fetch: the verbatim body (stored as the raw
/// snapshot) and its typed view (fed to the aggregator).
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    pub body: Value,
    pub payload: RawPayload,
}

impl FetchedPayload {
    pub fn from_body(body: Value) -> Result<Self> {
        let payload = RawPayload::from_value(&body)?;
        Ok(Self { body, payload })
    }
}

// ---------------------------------------------------------------------------
// NormalizedRecord / CleanedSnapshot - What gets persisted per cycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    /// Percentage share (raw fraction × 100), summed across duplicates.
    pub amount: f64,
    #[serde(with = "snapshot_time")]
    pub snapshot: NaiveDateTime,
}

/// Canonical name -> record, unique within one snapshot and category.
pub type CategoryRecords = BTreeMap<String, NormalizedRecord>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleanedSnapshot(pub BTreeMap<String, CategoryRecords>);

impl CleanedSnapshot {
    pub fn category(&self, category: Category) -> Option<&CategoryRecords> {
        self.0.get(category.as_str())
    }

    /// Timestamp of the first record in key order, if the snapshot has any.
    ///
    /// Every record of one cycle carries the same timestamp, so any record
    /// dates the whole snapshot.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.0
            .values()
            .flat_map(|records| records.values())
            .map(|r| r.snapshot)
            .next()
    }

    pub fn record_count(&self) -> usize {
        self.0.values().map(|r| r.len()).sum()
    }
}
