//! CSV export artifacts.

mod common;

use std::fs;

use common::{at, write_cleaned};
use hivestats::config;
use hivestats::{load_report_tables, Category, Exporter};

fn read_sheet(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn export_all_writes_one_sheet_per_category() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let out = tmp.path().join("out");
    write_cleaned(&data, at("2026-10-15 12:00:00"));

    let tables = load_report_tables(&data).unwrap();
    let report = Exporter::new(&out).export_all(&tables).unwrap();

    assert_eq!(report.snapshot, out.join(config::SNAPSHOT_EXPORT));
    assert_eq!(report.differences, out.join(config::DIFFERENCES_EXPORT));
    assert_eq!(report.daily_pivot, out.join(config::DAILY_PIVOT_EXPORT));
    assert_eq!(report.monthly_pivot, out.join(config::MONTHLY_PIVOT_EXPORT));

    for dir in [
        &report.snapshot,
        &report.differences,
        &report.daily_pivot,
        &report.monthly_pivot,
    ] {
        for category in Category::ALL {
            assert!(Exporter::sheet_path(dir, category).is_file(), "{category} in {dir:?}");
        }
        assert_eq!(fs::read_dir(dir).unwrap().count(), Category::ALL.len());
    }
}

#[test]
fn snapshot_sheet_lists_every_row() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-15 12:00:00"));
    let tables = load_report_tables(tmp.path()).unwrap();

    let dir = Exporter::new(tmp.path().join("out"))
        .export_snapshot(&tables)
        .unwrap();
    let sheet = read_sheet(&Exporter::sheet_path(&dir, Category::GpuBrands));

    assert_eq!(sheet[0], vec!["name", "amount", "snapshot"]);
    assert_eq!(sheet.len(), 3);
    assert_eq!(sheet[1][0], "AMD");
    assert_eq!(sheet[1][2], "2026-10-15 12:00:00");
    assert_eq!(sheet[2][0], "NVIDIA");

    let empty = read_sheet(&Exporter::sheet_path(&dir, Category::Miners));
    assert_eq!(empty.len(), 1);
}

#[test]
fn differences_sheet_leaves_single_observations_blank() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-15 12:00:00"));
    let tables = load_report_tables(tmp.path()).unwrap();

    let dir = Exporter::new(tmp.path().join("out"))
        .export_differences(&tables)
        .unwrap();
    let sheet = read_sheet(&Exporter::sheet_path(&dir, Category::Coins));

    assert_eq!(sheet[0], vec!["name", "amount_difference"]);
    assert_eq!(sheet.len(), 3);
    assert!(sheet[1..].iter().all(|r| r[1].is_empty()));
}

#[test]
fn differences_sheet_reports_change_between_snapshots() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-10-15 12:00:00"));
    write_cleaned(tmp.path(), at("2026-10-16 12:00:00"));
    let tables = load_report_tables(tmp.path()).unwrap();

    let dir = Exporter::new(tmp.path().join("out"))
        .export_differences(&tables)
        .unwrap();
    let sheet = read_sheet(&Exporter::sheet_path(&dir, Category::Coins));

    let etc = sheet.iter().find(|r| r[0] == "ETC").unwrap();
    assert_eq!(etc[1].parse::<f64>().unwrap(), 0.0);
}

#[test]
fn pivot_sheets_have_period_columns() {
    let tmp = tempfile::tempdir().unwrap();
    write_cleaned(tmp.path(), at("2026-09-30 12:00:00"));
    write_cleaned(tmp.path(), at("2026-10-02 12:00:00"));
    let tables = load_report_tables(tmp.path()).unwrap();
    let exporter = Exporter::new(tmp.path().join("out"));

    let daily = exporter.export_daily_pivot(&tables).unwrap();
    let sheet = read_sheet(&Exporter::sheet_path(&daily, Category::Algos));
    assert_eq!(sheet[0], vec!["name", "2026-09-30", "2026-10-02"]);
    assert_eq!(sheet.len(), 3);

    let monthly = exporter.export_monthly_pivot(&tables).unwrap();
    let sheet = read_sheet(&Exporter::sheet_path(&monthly, Category::Algos));
    assert_eq!(sheet[0], vec!["name", "2026-09", "2026-10"]);
    let etchash = sheet.iter().find(|r| r[0] == "ETCHASH").unwrap();
    assert_eq!(etchash[1].parse::<f64>().unwrap(), 50.0);
    assert_eq!(etchash[2].parse::<f64>().unwrap(), 50.0);
}

#[test]
fn exporting_empty_tables_writes_header_only_sheets() {
    let tmp = tempfile::tempdir().unwrap();
    let tables = load_report_tables(&tmp.path().join("absent")).unwrap();

    let report = Exporter::new(tmp.path()).export_all(&tables).unwrap();
    let sheet = read_sheet(&Exporter::sheet_path(&report.daily_pivot, Category::Coins));
    assert_eq!(sheet, vec![vec!["name".to_string()]]);
}
