//! Workbook loading.
//!
//! This module reads the dealership workbook (xlsx/xls/ods via calamine)
//! and turns each known sheet into a [`RecordTable`]. A missing workbook is
//! fatal; a missing or unreadable individual sheet is a warning and the
//! corresponding section is simply absent from the returned map.

use crate::models::section;
use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Workbook sheets and the bundle sections they feed.
const SHEET_SECTIONS: &[(&str, &str)] = &[
    ("VENTAS", section::SALES),
    ("VEHICULOS", section::INVENTORY),
    ("NUEVOS REGISTROS", section::NEW_REGISTRATIONS),
];

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Empty,
}

impl Value {
    /// Numeric view of the value. Numeric-looking text is accepted,
    /// everything else is None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// The value as a group-by key. Whole numbers print without a
    /// fractional part so year and ID columns read naturally.
    pub fn group_key(&self) -> Option<String> {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{}", n))
                }
            }
            Value::Text(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::Empty => None,
        }
    }
}

/// One logical dataset: named columns plus row-major values.
///
/// Column presence varies by source and must be checked before use.
#[derive(Debug, Clone)]
pub struct RecordTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordTable {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with empty cells.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (row, column index); Empty when out of bounds.
    pub fn value(&self, row: usize, column: usize) -> &Value {
        static EMPTY: Value = Value::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }
}

/// Load the known sheets of the workbook at `path` into record tables
/// keyed by canonical section name.
///
/// Fatal when the workbook is missing or unreadable; per-sheet problems
/// are logged and skipped.
pub fn load_workbook(path: &Path) -> Result<HashMap<String, RecordTable>> {
    if !path.exists() {
        bail!("workbook not found: {}", path.display());
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;

    let sheet_names = workbook.sheet_names();
    let mut tables = HashMap::new();

    for (sheet, section_name) in SHEET_SECTIONS {
        if !sheet_names.iter().any(|name| name == sheet) {
            warn!("Sheet '{}' not found in workbook; skipping", sheet);
            continue;
        }

        match workbook.worksheet_range(sheet) {
            Ok(range) => {
                let table = range_to_table(section_name, &range);
                debug!(
                    "Sheet '{}' -> section '{}': {} rows, {} columns",
                    sheet,
                    section_name,
                    table.len(),
                    table.columns.len()
                );
                tables.insert(section_name.to_string(), table);
            }
            Err(e) => {
                warn!("Failed to read sheet '{}': {}; skipping", sheet, e);
            }
        }
    }

    info!(
        "Loaded {} of {} sections from {}",
        tables.len(),
        SHEET_SECTIONS.len(),
        path.display()
    );

    Ok(tables)
}

/// Convert a calamine cell range into a record table. The first row is
/// the header; fully empty rows are dropped.
fn range_to_table(name: &str, range: &Range<Data>) -> RecordTable {
    let mut rows = range.rows();

    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut table = RecordTable {
        name: name.to_string(),
        columns,
        rows: Vec::new(),
    };

    for row in rows {
        let values: Vec<Value> = row.iter().map(cell_to_value).collect();
        if values.iter().all(|v| *v == Value::Empty) {
            continue;
        }
        table.push_row(values);
    }

    table
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Empty
            } else {
                Value::Text(trimmed.to_string())
            }
        }
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Value::Date(naive.date()),
            None => Value::Empty,
        },
        Data::DateTimeIso(s) => {
            // Full datetime first, then bare date.
            if let Ok(dt) = s.parse::<chrono::NaiveDateTime>() {
                Value::Date(dt.date())
            } else if let Ok(d) = s.parse::<NaiveDate>() {
                Value::Date(d)
            } else {
                Value::Text(s.clone())
            }
        }
        Data::DurationIso(_) | Data::Error(_) => Value::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Text("17".to_string()).as_number(), Some(17.0));
        assert_eq!(Value::Text("n/a".to_string()).as_number(), None);
        assert_eq!(Value::Empty.as_number(), None);
    }

    #[test]
    fn test_value_group_key() {
        assert_eq!(Value::Number(2021.0).group_key().as_deref(), Some("2021"));
        assert_eq!(Value::Number(1.5).group_key().as_deref(), Some("1.5"));
        assert_eq!(
            Value::Text("Web".to_string()).group_key().as_deref(),
            Some("Web")
        );
        assert_eq!(Value::Empty.group_key(), None);
    }

    #[test]
    fn test_record_table_columns() {
        let mut table = RecordTable::new("sales", &["Canal", "Precio Venta Real"]);
        table.push_row(vec![Value::Text("Web".to_string())]);

        assert!(table.has_column("Canal"));
        assert!(!table.has_column("Fecha"));
        assert_eq!(table.column_index("Precio Venta Real"), Some(1));
        // Short row is padded.
        assert_eq!(*table.value(0, 1), Value::Empty);
    }

    #[test]
    fn test_cell_to_value_conversions() {
        assert_eq!(cell_to_value(&Data::Float(3.0)), Value::Number(3.0));
        assert_eq!(cell_to_value(&Data::Int(7)), Value::Number(7.0));
        assert_eq!(
            cell_to_value(&Data::String("  Toyota ".to_string())),
            Value::Text("Toyota".to_string())
        );
        assert_eq!(cell_to_value(&Data::String("  ".to_string())), Value::Empty);
        assert_eq!(
            cell_to_value(&Data::DateTimeIso("2024-05-01".to_string())),
            Value::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        assert_eq!(cell_to_value(&Data::Empty), Value::Empty);
    }

    #[test]
    fn test_load_workbook_missing_file_is_fatal() {
        let result = load_workbook(Path::new("does_not_exist.xlsx"));
        assert!(result.is_err());
    }
}
