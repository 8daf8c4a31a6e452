//! Best-effort typed coercion.
//!
//! Attempts a typed conversion per row, collects successes, and counts
//! failures for diagnostics. Rows that fail coercion are dropped only from
//! the metric being computed, never from the table.

use crate::source::{RecordTable, Value};
use chrono::NaiveDate;

/// Date formats accepted by the permissive parser, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Excel serial date epoch (the 1900 date system, Lotus leap-year quirk
/// included).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Result of coercing one column: one slot per row, plus the number of
/// rows that failed.
#[derive(Debug, Clone, Default)]
pub struct Coerced<T> {
    pub values: Vec<Option<T>>,
    pub failed: usize,
}

impl<T> Coerced<T> {
    /// Number of rows that coerced successfully.
    pub fn valid(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Coerce every row of `column` to a date. Returns None when the column
/// does not exist.
pub fn coerce_dates(table: &RecordTable, column: &str) -> Option<Coerced<NaiveDate>> {
    let index = table.column_index(column)?;

    let mut coerced = Coerced::default();
    for row in 0..table.len() {
        let date = parse_date(table.value(row, index));
        if date.is_none() {
            coerced.failed += 1;
        }
        coerced.values.push(date);
    }

    Some(coerced)
}

/// Permissively parse one cell as a date.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date_str(s.trim()),
        Value::Number(serial) => excel_serial_to_date(*serial),
        Value::Empty => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Interpret a number as an Excel serial date when it falls in a
/// plausible range (1900-01-01 .. 9999-12-31).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(2.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for raw in ["2024-03-15", "15/03/2024", "15-03-2024", "2024/03/15"] {
            assert_eq!(
                parse_date(&Value::Text(raw.to_string())),
                Some(expected),
                "failed for {raw}"
            );
        }
        assert_eq!(
            parse_date(&Value::Text("2024-03-15 10:30:00".to_string())),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(&Value::Text("not a date".to_string())), None);
        assert_eq!(parse_date(&Value::Empty), None);
    }

    #[test]
    fn test_excel_serial_dates() {
        // 45000 days after 1899-12-30 is 2023-03-15.
        assert_eq!(
            parse_date(&Value::Number(45000.0)),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
        // Ordinary small numbers are not dates.
        assert_eq!(parse_date(&Value::Number(1.0)), None);
    }

    #[test]
    fn test_coerce_dates_counts_failures() {
        let mut table = RecordTable::new("sales", &["Fecha"]);
        table.push_row(vec![Value::Text("2024-01-02".to_string())]);
        table.push_row(vec![Value::Text("garbage".to_string())]);
        table.push_row(vec![Value::Date(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )]);

        let coerced = coerce_dates(&table, "Fecha").unwrap();
        assert_eq!(coerced.values.len(), 3);
        assert_eq!(coerced.failed, 1);
        assert_eq!(coerced.valid(), 2);
    }

    #[test]
    fn test_coerce_dates_missing_column() {
        let table = RecordTable::new("sales", &["Canal"]);
        assert!(coerce_dates(&table, "Fecha").is_none());
    }
}
