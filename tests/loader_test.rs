// Tests for DataLoader: spreadsheet discovery, workbook/CSV parsing and date coercion

mod common;

use chrono::NaiveDate;
use wacc_dashboard::aggregator::summarize;
use wacc_dashboard::data::{Cell, DataError, DataLoader, DateCoercion};

#[test]
fn test_load_sample_workbook() {
    let dir = common::data_dir_with_sample_workbook();
    let table = DataLoader::new(dir.path())
        .load()
        .expect("Sample workbook should load");

    assert_eq!(
        table.headers(),
        &["Date", "Cost of Equity", "Cost of Debt", "WACC"]
    );
    assert_eq!(table.len(), 3);
    assert!(table.dates_parsed());
    assert_eq!(table.value_header(), "WACC");
    assert_eq!(
        table.rows()[0][0],
        Cell::Date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
    );
    assert_eq!(
        table.rows()[2][0],
        Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    );
    assert_eq!(table.rows()[1][3], Cell::Number(0.09));
}

#[test]
fn test_sample_workbook_scenario() {
    let dir = common::data_dir_with_sample_workbook();
    let table = DataLoader::new(dir.path()).load().unwrap();
    let summary = summarize(&table).unwrap();

    assert_eq!(summary.stats.minimum, 0.08);
    assert_eq!(summary.stats.maximum, 0.1);
    assert!((summary.stats.average - 0.09).abs() < 1e-9);
    assert_eq!(summary.current.value, 0.1);
    assert_eq!(summary.current.previous, Some(0.09));
    assert!((summary.current.delta.unwrap() - 0.01).abs() < 1e-9);

    let yearly = summary.yearly.expect("Dates should allow yearly aggregation");
    assert_eq!(yearly.years(), vec![2023, 2024]);
    assert!((yearly.averages()[0] - 0.085).abs() < 1e-9);
    assert!((yearly.averages()[1] - 0.10).abs() < 1e-9);
}

#[test]
fn test_no_spreadsheet_found() {
    let dir = common::data_dir_with("notes.txt", "not a spreadsheet");
    let result = DataLoader::new(dir.path()).load();

    match result {
        Err(DataError::NoDataFound { dir: reported }) => assert_eq!(reported, dir.path()),
        other => panic!("Expected NoDataFound, got {other:?}"),
    }
}

#[test]
fn test_missing_directory() {
    let result = DataLoader::new("/nonexistent/wacc/data").load();
    assert!(matches!(result, Err(DataError::Io { .. })));
}

#[test]
fn test_corrupt_workbook_is_parse_error() {
    let dir = common::data_dir_with("broken.xlsx", "this is not a zip archive");
    let result = DataLoader::new(dir.path()).load();

    match result {
        Err(DataError::Parse { path, .. }) => assert!(path.ends_with("broken.xlsx")),
        other => panic!("Expected Parse error, got {other:?}"),
    }
}

#[test]
fn test_load_csv() {
    let dir = common::data_dir_with("wacc.csv", common::SCENARIO_CSV);
    let table = DataLoader::new(dir.path()).load().unwrap();

    assert_eq!(table.width(), 4);
    assert_eq!(table.len(), 3);
    assert!(table.dates_parsed());
    assert_eq!(table.rows()[2][3], Cell::Number(0.10));
}

#[test]
fn test_single_column_rejected() {
    let dir = common::data_dir_with("wacc.csv", "WACC\n0.08\n0.09\n");
    let result = DataLoader::new(dir.path()).load();
    assert!(matches!(result, Err(DataError::ColumnLayout { found: 1 })));
}

#[test]
fn test_first_file_in_lexical_order_wins() {
    let dir = common::data_dir_with("b_wacc.csv", "Date,WACC\n2023-01-01,0.2\n");
    common::write_file(dir.path(), "a_wacc.csv", "Date,WACC\n2023-01-01,0.1\n");
    common::write_file(dir.path(), "c_wacc.csv", "Date,WACC\n2023-01-01,0.3\n");
    common::write_file(dir.path(), "~$a_lock.xlsx", "lock");

    let loader = DataLoader::new(dir.path());
    let located = loader.locate().unwrap();
    assert!(located.ends_with("a_wacc.csv"));

    let table = loader.load().unwrap();
    assert_eq!(table.rows()[0][1], Cell::Number(0.1));
}

#[test]
fn test_unparseable_dates_degrade_gracefully() {
    let dir = common::data_dir_with(
        "wacc.csv",
        "Period,WACC\nQ1 2023,0.08\nQ2 2023,0.09\nQ1 2024,0.10\n",
    );
    let table = DataLoader::new(dir.path()).load().unwrap();

    assert!(!table.dates_parsed());
    assert_eq!(
        table.date_coercion(),
        &DateCoercion::Failed {
            row: 1,
            value: "Q1 2023".into()
        }
    );

    let summary = summarize(&table).unwrap();
    assert!(summary.yearly.is_none());
    assert_eq!(summary.stats.minimum, 0.08);
    assert_eq!(summary.current.label, "Q1 2024");
    assert!((summary.current.delta.unwrap() - 0.01).abs() < 1e-9);
}

#[test]
fn test_header_only_file_is_empty_dataset() {
    let dir = common::data_dir_with("wacc.csv", "Date,WACC\n");
    let table = DataLoader::new(dir.path()).load().unwrap();

    assert!(table.is_empty());
    assert!(summarize(&table).is_err());
}
