//! Loading stored snapshots back into report tables.

mod common;

use std::fs;
use std::sync::Arc;

use common::{assert_close, at, write_cleaned, MockSource};
use hivestats::models::ReportRow;
use hivestats::report::load_files;
use hivestats::{load_report_tables, Category, ReportCache, ReportTables, SnapshotKind, SnapshotStore};

#[test]
fn missing_data_dir_yields_empty_tables() {
    let tmp = tempfile::tempdir().unwrap();
    let tables = load_report_tables(&tmp.path().join("absent")).unwrap();

    assert!(tables.is_empty());
    assert_eq!(tables.file_count(), 0);
    for category in Category::ALL {
        assert!(tables.table(category).is_empty());
    }
}

#[test]
fn stored_snapshot_round_trips_record_for_record() {
    let tmp = tempfile::tempdir().unwrap();
    let when = at("2026-10-16 12:00:00");
    let path = write_cleaned(tmp.path(), when);
    let stored = hivestats::store::read_cleaned(&path).unwrap();

    let tables = load_report_tables(tmp.path()).unwrap();
    assert_eq!(tables.file_count(), 1);

    for category in Category::ALL {
        let records = stored.category(category).unwrap();
        let rows = tables.table(category);
        assert_eq!(rows.len(), records.len(), "{category}");
        for row in rows {
            let record = &records[&row.name];
            assert_eq!(row.amount, record.amount);
            assert_eq!(row.snapshot, record.snapshot);
        }
    }
}

#[test]
fn categories_absent_from_payload_load_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let scheduler = common::scheduler(tmp.path(), Arc::new(MockSource::sample()));
    assert!(scheduler.tick(at("2026-10-16 12:00:00")).is_completed());

    let tables = load_report_tables(tmp.path()).unwrap();
    for category in [
        Category::Coins,
        Category::Algos,
        Category::GpuBrands,
        Category::NvidiaModels,
    ] {
        assert!(!tables.table(category).is_empty(), "{category} empty");
    }
    assert!(tables.table(Category::AmdModels).is_empty());
    assert!(tables.table(Category::Miners).is_empty());

    let etc: Vec<&ReportRow> = tables
        .table(Category::Coins)
        .iter()
        .filter(|r| r.name == "ETC")
        .collect();
    assert_eq!(etc.len(), 1);
    assert_close(etc[0].amount, 42.0);
}

#[test]
fn file_order_does_not_matter() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_cleaned(tmp.path(), at("2026-10-14 12:00:00"));
    let b = write_cleaned(tmp.path(), at("2026-10-15 12:00:00"));
    let c = write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));

    let forward = load_files(&[a.clone(), b.clone(), c.clone()]);
    let backward = load_files(&[c.clone(), b.clone(), a.clone()]);
    let shuffled = load_files(&[b, a, c]);

    assert_eq!(forward, backward);
    assert_eq!(forward, shuffled);
    assert_eq!(forward.file_count(), 3);
}

#[test]
fn rows_are_in_snapshot_order() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));
    write_cleaned(tmp.path(), at("2026-10-14 12:00:00"));

    let tables = load_report_tables(tmp.path()).unwrap();
    let rows = tables.table(Category::Coins);
    assert!(rows.windows(2).all(|w| w[0].snapshot <= w[1].snapshot));
    assert_eq!(rows.first().unwrap().snapshot, at("2026-10-14 12:00:00"));
}

#[test]
fn unreadable_files_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));
    fs::write(
        tmp.path().join("cleaned_data_oct_2026-10-15_12-00-00.json"),
        "not json",
    )
    .unwrap();

    let tables = load_report_tables(tmp.path()).unwrap();
    assert_eq!(tables.file_count(), 1);
    assert!(!tables.is_empty());
}

#[test]
fn raw_files_are_not_loaded() {
    let tmp = tempfile::tempdir().unwrap();
    SnapshotStore::new(tmp.path())
        .store(&common::sample_body(), SnapshotKind::Raw, at("2026-10-16 12:00:00"))
        .unwrap();

    let tables = load_report_tables(tmp.path()).unwrap();
    assert!(tables.is_empty());
}

#[test]
fn loading_twice_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));

    let first = load_report_tables(tmp.path()).unwrap();
    let second = load_report_tables(tmp.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn from_snapshots_matches_loading_files() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));
    let snapshot = hivestats::store::read_cleaned(&path).unwrap();

    assert_eq!(
        ReportTables::from_snapshots([&snapshot]),
        load_report_tables(tmp.path()).unwrap()
    );
}

// ---------------------------------------------------------------------------
// ReportCache
// ---------------------------------------------------------------------------

#[test]
fn reload_swaps_tables_without_touching_old_readers() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-15 12:00:00"));

    let cache = ReportCache::load(tmp.path()).unwrap();
    let before = cache.current();
    assert_eq!(before.file_count(), 1);

    write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));
    let reloaded = cache.reload().unwrap();

    assert_eq!(before.file_count(), 1);
    assert_eq!(reloaded.file_count(), 2);
    assert!(Arc::ptr_eq(&reloaded, &cache.current()));
    assert_eq!(
        cache.current().table(Category::Coins).len(),
        2 * before.table(Category::Coins).len()
    );
}
