//! Workbook data structures

use std::collections::HashMap;

/// Represents a complete workbook
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Represents a worksheet. Positions are 0-based (row, col).
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), CellValue>,
    pub used_range: Option<(u32, u32)>, // (rows, cols)
}

static EMPTY: CellValue = CellValue::Empty;

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Value at the given position, `Empty` when the cell is absent
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Store a value, growing the used range as needed
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
            return;
        }
        let (rows, cols) = self.used_range.unwrap_or((0, 0));
        self.used_range = Some((rows.max(row + 1), cols.max(col + 1)));
        self.cells.insert((row, col), value);
    }

    /// Number of rows covered by the used range
    pub fn row_count(&self) -> u32 {
        self.used_range.map(|(rows, _)| rows).unwrap_or(0)
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Serial date value; never treated as a metric
    DateTime(f64),
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Finite numeric content, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Render the cell as label text. Whole numbers drop their fraction.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty | CellValue::Error(_) => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) | CellValue::DateTime(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            CellValue::Boolean(b) => Some(b.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_tracks_used_range() {
        let mut sheet = Sheet::new("202401");
        sheet.set_value(4, 1, CellValue::Number(3.0));
        sheet.set_value(1, 3, CellValue::Text("x".into()));

        assert_eq!(sheet.used_range, Some((5, 4)));
        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.value(4, 1).as_number(), Some(3.0));
        assert!(sheet.value(0, 0).is_empty());
    }

    #[test]
    fn test_label_text() {
        assert_eq!(CellValue::Number(5.0).to_text().as_deref(), Some("5"));
        assert_eq!(CellValue::Number(0.05).to_text().as_deref(), Some("0.05"));
        assert_eq!(CellValue::Empty.to_text(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::DateTime(45000.0).as_number(), None);
    }
}
