use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SAMPLE_WORKBOOK: &str = "sample-data-files/wacc_sample.xlsx";

/// Scenario data: three observations over two calendar years
pub const SCENARIO_CSV: &str = "Date,Cost of Equity,Cost of Debt,WACC\n\
2023-01-01,0.11,0.05,0.08\n\
2023-06-01,0.12,0.055,0.09\n\
2024-01-01,0.13,0.06,0.10\n";

/// Create a temporary data directory holding one file
pub fn data_dir_with(name: &str, contents: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(dir.path(), name, contents);
    dir
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write test file");
    path
}

/// Temporary data directory containing a copy of the sample workbook
pub fn data_dir_with_sample_workbook() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::copy(SAMPLE_WORKBOOK, dir.path().join("wacc_sample.xlsx"))
        .expect("Failed to copy sample workbook");
    dir
}
