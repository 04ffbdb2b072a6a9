//! Excel/ODS and CSV readers

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::path::Path;

pub mod csv_table;
pub mod workbook;

pub use csv_table::{CsvTable, read_csv};
pub use workbook::{CellValue, Sheet, Workbook};

/// Read a workbook from a file path
///
/// A sheet whose range cannot be read is logged and kept empty, so the
/// remaining sheets of the file are still available to extraction.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let mut excel: Sheets<_> = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let sheet_names = excel.sheet_names();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        match excel.worksheet_range(sheet_name) {
            Ok(range) => sheets.push(parse_sheet(sheet_name, &range)),
            Err(e) => {
                log::warn!(
                    "{}: failed to read sheet '{}': {}",
                    path.display(),
                    sheet_name,
                    e
                );
                sheets.push(Sheet::new(sheet_name.as_str()));
            }
        }
    }

    Ok(Workbook { sheets })
}

fn parse_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);

    // used_cells() reports positions relative to the range start
    let (start_row, start_col) = match range.start() {
        Some(start) => start,
        None => return sheet,
    };

    for (rel_row, rel_col, data) in range.used_cells() {
        let value = parse_cell_value(data);
        if value.is_empty() {
            continue;
        }
        sheet.set_value(start_row + rel_row as u32, start_col + rel_col as u32, value);
    }

    sheet
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
