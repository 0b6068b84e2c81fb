use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use super::error::DataError;
use super::table::{Cell, Table};

/// File extensions recognised as spreadsheets (compared case-insensitively)
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

/// Locates the WACC spreadsheet in a directory and parses it into a [`Table`]
///
/// Parsing is synchronous; async callers should use `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Locate, read and parse the spreadsheet
    #[instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    pub fn load(&self) -> Result<Table, DataError> {
        let path = self.locate()?;
        info!("Loading spreadsheet {}", path.display());

        let (headers, rows) = if has_extension(&path, "csv") {
            read_csv(&path)?
        } else {
            read_workbook(&path)?
        };
        debug!("Read {} columns and {} raw rows", headers.len(), rows.len());

        let table = Table::new(path, headers, rows)?;
        info!(
            "Loaded {} rows from {} (dates parsed: {})",
            table.len(),
            table.source().display(),
            table.dates_parsed()
        );
        Ok(table)
    }

    /// Pick the spreadsheet to load
    ///
    /// Candidates are sorted by file name (byte order) and the first one wins,
    /// so the choice does not depend on directory enumeration order.
    pub fn locate(&self) -> Result<PathBuf, DataError> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| DataError::Io {
            path: self.data_dir.clone(),
            source: e,
        })?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::Io {
                path: self.data_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && is_spreadsheet(&path) {
                candidates.push(path);
            }
        }

        candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut candidates = candidates.into_iter();
        let selected = candidates.next().ok_or_else(|| DataError::NoDataFound {
            dir: self.data_dir.clone(),
        })?;

        for ignored in candidates {
            warn!(
                "Multiple spreadsheets found; using {} and ignoring {}",
                selected.display(),
                ignored.display()
            );
        }

        Ok(selected)
    }
}

fn is_spreadsheet(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Hidden files and Office lock files ("~$book.xlsx")
    if name.starts_with('.') || name.starts_with("~$") {
        return false;
    }
    SPREADSHEET_EXTENSIONS
        .iter()
        .any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

type RawSheet = (Vec<String>, Vec<Vec<Cell>>);

/// Read the first worksheet; its first row is the header row
fn read_workbook(path: &Path) -> Result<RawSheet, DataError> {
    let parse_error = |message: String| DataError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| parse_error(format!("Failed to open workbook: {e}")))?;

    let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error("Workbook contains no worksheets".to_string()))?
        .map_err(|e| parse_error(format!("Failed to read sheet '{sheet_name}': {e}")))?;
    debug!("Reading sheet '{}' ({:?})", sheet_name, range.get_size());

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| header.iter().map(|d| convert_cell(d).to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok((headers, rows))
}

/// Read a CSV file with a header row, inferring cell types from the text
fn read_csv(path: &Path) -> Result<RawSheet, DataError> {
    let parse_error = |e: csv::Error| DataError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_error)?;

    let headers = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        rows.push(record.iter().map(Cell::infer).collect());
    }

    Ok((headers, rows))
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.trim().to_string()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(excel_date) if excel_date.is_datetime() => {
            match excel_date.as_datetime() {
                Some(dt) => datetime_cell(dt),
                None => Cell::Number(excel_date.as_f64()),
            }
        }
        Data::DateTime(excel_date) => Cell::Number(excel_date.as_f64()),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(datetime_cell)
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Cell::Date))
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => {
            warn!("Spreadsheet cell contains an error value: {}", e);
            Cell::Text(e.to_string())
        }
    }
}

fn datetime_cell(dt: NaiveDateTime) -> Cell {
    if dt.time() == chrono::NaiveTime::MIN {
        Cell::Date(dt.date())
    } else {
        Cell::DateTime(dt)
    }
}
