//! Shared test fixtures for the hivestats integration tests.
//!
//! Provides a sample API payload, a mock `SnapshotSource` that counts calls,
//! and helpers for building schedulers over temporary data directories.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use hivestats::models::{FetchedPayload, SNAPSHOT_FORMAT};
use hivestats::{
    Aggregator, HiveStatsError, Normalizer, Result, Scheduler, SnapshotKind, SnapshotSource,
    SnapshotStore,
};
use serde_json::Value;

/// Payload shaped like the Hive OS stats response. `amd_models` and `miners`
/// are deliberately absent.
pub fn sample_body() -> Value {
    serde_json::json!({
        "coins": [
            {"name": "ETC", "amount": 0.42},
            {"name": "Kaspa", "amount": 0.10},
            {"name": "kaspa", "amount": 0.05},
            {"name": "SMH \u{6c38}\u{5dde}", "amount": 0.30}
        ],
        "algos": [
            {"name": "etchash", "amount": 0.5},
            {"name": "kHeavyHash", "amount": 0.25}
        ],
        "gpu_brands": [
            {"name": "nvidia", "amount": 0.7},
            {"name": "amd", "amount": 0.3}
        ],
        "nvidia_models": [
            {"name": "RTX 3080 Ti!", "amount": 0.08, "extra": "ignored"},
            {"name": "RTX 3070", "amount": 0.12}
        ]
    })
}

pub fn sample_payload() -> FetchedPayload {
    FetchedPayload::from_body(sample_body()).unwrap()
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, SNAPSHOT_FORMAT).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Serves a fixed body, or fails every call when constructed with `failing()`.
pub struct MockSource {
    body: Option<Value>,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(body: Value) -> Self {
        Self {
            body: Some(body),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn sample() -> Self {
        Self::new(sample_body())
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for MockSource {
    fn fetch(&self) -> Result<FetchedPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => FetchedPayload::from_body(body.clone()),
            None => Err(HiveStatsError::Payload("mock endpoint unavailable".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler / store helpers
// ---------------------------------------------------------------------------

pub fn scheduler(data_dir: &Path, source: Arc<MockSource>) -> Scheduler {
    Scheduler::new(
        source,
        Aggregator::new(Normalizer::default()),
        SnapshotStore::new(data_dir),
    )
}

/// Store a cleaned snapshot of the sample payload stamped `when`.
pub fn write_cleaned(data_dir: &Path, when: NaiveDateTime) -> std::path::PathBuf {
    let cleaned = Aggregator::default().aggregate(&sample_payload().payload, when);
    SnapshotStore::new(data_dir)
        .store(&cleaned, SnapshotKind::Cleaned, when)
        .unwrap()
}

pub fn count_files(data_dir: &Path, kind: SnapshotKind) -> usize {
    SnapshotStore::new(data_dir).list(kind).unwrap().len()
}
