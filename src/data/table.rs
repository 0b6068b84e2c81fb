use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::dates::{coerce_cell, CellDate};
use super::error::DataError;

/// A single typed spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Infer a cell from raw text (CSV fields carry no type information)
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Cell::Number(n);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Cell::Bool(true),
            "false" => Cell::Bool(false),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Numeric reading of the cell, used for the value column
    ///
    /// Numbers stored as text are accepted; NaN and infinities are not.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Cell::Number(_) => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Text(_) | Cell::Date(_) | Cell::DateTime(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// Index of the time axis column (always the first column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateColumn(usize);

/// Index of the metric column (always the last column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueColumn(usize);

impl DateColumn {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ValueColumn {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Result of converting the date column to calendar dates
#[derive(Debug, Clone, PartialEq)]
pub enum DateCoercion {
    /// Every non-blank cell in the column is now a `Cell::Date`
    Parsed,
    /// The column was left as loaded; `row` is the 1-based data row of the first failure
    Failed { row: usize, value: String },
}

/// Column-projected copy of a table, as shown in the detail view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableView {
    pub columns: Vec<String>,
    #[schema(value_type = Vec<Vec<Object>>)]
    pub rows: Vec<Vec<Cell>>,
}

/// Spreadsheet contents: a header row plus fixed-width data rows
///
/// Construction validates the positional contract (first column = dates,
/// last column = values) and attempts date coercion on the first column.
#[derive(Debug, Clone)]
pub struct Table {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    date_column: DateColumn,
    value_column: ValueColumn,
    date_coercion: DateCoercion,
}

impl Table {
    pub fn new(
        source: impl Into<PathBuf>,
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, DataError> {
        let width = headers.len();
        if width < 2 {
            return Err(DataError::ColumnLayout { found: width });
        }

        let headers = normalize_headers(headers);
        let mut rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .map(|mut row| {
                if row.len() > width {
                    debug!("Truncating row with {} cells to {} columns", row.len(), width);
                }
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        let date_column = DateColumn(0);
        let value_column = ValueColumn(width - 1);
        let date_coercion = coerce_date_column(&mut rows, date_column);

        if let DateCoercion::Failed { row, value } = &date_coercion {
            warn!(
                "Column '{}' could not be parsed as dates (row {}: '{}'); keeping it as text",
                headers[0], row, value
            );
        }

        Ok(Self {
            source: source.into(),
            headers,
            rows,
            date_column,
            value_column,
            date_coercion,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn date_column(&self) -> DateColumn {
        self.date_column
    }

    pub fn value_column(&self) -> ValueColumn {
        self.value_column
    }

    pub fn date_header(&self) -> &str {
        &self.headers[self.date_column.index()]
    }

    pub fn value_header(&self) -> &str {
        &self.headers[self.value_column.index()]
    }

    pub fn date_coercion(&self) -> &DateCoercion {
        &self.date_coercion
    }

    pub fn dates_parsed(&self) -> bool {
        self.date_coercion == DateCoercion::Parsed
    }

    /// Project the table onto the named columns, in the order given
    ///
    /// An empty selection returns every column.
    pub fn select(&self, columns: &[String]) -> Result<TableView, DataError> {
        if columns.is_empty() {
            return Ok(TableView {
                columns: self.headers.clone(),
                rows: self.rows.clone(),
            });
        }

        let indices = columns
            .iter()
            .map(|name| {
                self.headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| DataError::UnknownColumn(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(TableView {
            columns: columns.to_vec(),
            rows,
        })
    }

    /// Render the full table as comma-separated UTF-8 text with a header row
    pub fn to_csv(&self) -> Result<String, DataError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.headers)
            .map_err(|e| DataError::CsvEncode(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(|c| c.to_string()))
                .map_err(|e| DataError::CsvEncode(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DataError::CsvEncode(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DataError::CsvEncode(e.to_string()))
    }
}

/// Fill blank headers and disambiguate duplicates ("WACC", "WACC.1", ...)
fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = match header.trim() {
                "" => format!("Unnamed: {idx}"),
                trimmed => trimmed.to_string(),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

/// All-or-nothing conversion of the date column
///
/// Blank cells are tolerated and stay `Empty`. If any other cell fails to
/// parse, the column is left untouched.
fn coerce_date_column(rows: &mut [Vec<Cell>], column: DateColumn) -> DateCoercion {
    let col = column.index();
    let mut parsed = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        match coerce_cell(&row[col]) {
            CellDate::Date(d) => parsed.push(Some(d)),
            CellDate::Blank => parsed.push(None),
            CellDate::Invalid => {
                return DateCoercion::Failed {
                    row: idx + 1,
                    value: row[col].to_string(),
                };
            }
        }
    }

    for (row, date) in rows.iter_mut().zip(parsed) {
        row[col] = date.map_or(Cell::Empty, Cell::Date);
    }

    DateCoercion::Parsed
}
