use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::table::Cell;

/// Date-only layouts accepted for text cells, tried in order.
/// Month-first is preferred over day-first for slash dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Largest serial Excel can represent (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert an Excel date serial number (1900 date system) to a calendar date
///
/// Fractional parts carry the time of day and are dropped. Serials below 1 or
/// beyond 9999-12-31 are rejected so that small metric values such as `0.08`
/// are never mistaken for dates.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let base_date = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base_date.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

/// Parse a text cell as a date, accepting date-only, datetime and RFC 3339 input
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Outcome of coercing a single cell
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellDate {
    Date(NaiveDate),
    Blank,
    Invalid,
}

pub(crate) fn coerce_cell(cell: &Cell) -> CellDate {
    match cell {
        Cell::Date(d) => CellDate::Date(*d),
        Cell::DateTime(dt) => CellDate::Date(dt.date()),
        Cell::Number(n) => excel_serial_to_date(*n).map_or(CellDate::Invalid, CellDate::Date),
        Cell::Text(s) if s.trim().is_empty() => CellDate::Blank,
        Cell::Text(s) => parse_date_text(s).map_or(CellDate::Invalid, CellDate::Date),
        Cell::Empty => CellDate::Blank,
        Cell::Bool(_) => CellDate::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(
            excel_serial_to_date(44927.0),
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert_eq!(
            excel_serial_to_date(45292.75),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn test_excel_serial_rejects_metric_values() {
        assert_eq!(excel_serial_to_date(0.08), None);
        assert_eq!(excel_serial_to_date(-3.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(3_000_000.0), None);
    }

    #[test]
    fn test_parse_date_text_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 6, 1);
        assert_eq!(parse_date_text("2023-06-01"), expected);
        assert_eq!(parse_date_text(" 2023/06/01 "), expected);
        assert_eq!(parse_date_text("06/01/2023"), expected);
        assert_eq!(parse_date_text("01.06.2023"), expected);
        assert_eq!(parse_date_text("2023-06-01 13:45:00"), expected);
        assert_eq!(parse_date_text("2023-06-01T13:45:00"), expected);
        assert_eq!(parse_date_text("2023-06-01T13:45:00+02:00"), expected);
    }

    #[test]
    fn test_parse_date_text_rejects_labels() {
        assert_eq!(parse_date_text("Q1 2023"), None);
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("2023-13-01"), None);
    }

    #[test]
    fn test_coerce_cell() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(coerce_cell(&Cell::Date(date)), CellDate::Date(date));
        assert_eq!(coerce_cell(&Cell::Number(44927.0)), CellDate::Date(date));
        assert_eq!(coerce_cell(&Cell::Empty), CellDate::Blank);
        assert_eq!(coerce_cell(&Cell::Text("  ".into())), CellDate::Blank);
        assert_eq!(coerce_cell(&Cell::Bool(true)), CellDate::Invalid);
        assert_eq!(coerce_cell(&Cell::Text("n/a".into())), CellDate::Invalid);
    }
}
