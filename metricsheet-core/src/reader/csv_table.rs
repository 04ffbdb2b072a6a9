//! Header-keyed CSV table

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A CSV file with its header row split off
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    /// Column names from the first row
    pub headers: Vec<String>,
    /// Data rows, one `String` per field; rows may be ragged
    pub rows: Vec<Vec<String>>,
    /// Records the CSV reader rejected (invalid UTF-8, broken quoting)
    pub malformed_rows: usize,
}

/// Read a CSV file from disk
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<CsvTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open CSV: {}", path.display()))?;
    CsvTable::from_reader(file).with_context(|| format!("Failed to read CSV: {}", path.display()))
}

impl CsvTable {
    /// Parse CSV content. A malformed record is skipped; a missing or
    /// unreadable header row is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV header row")?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                // Spreadsheet exports often start with a byte order mark
                let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                h.trim().to_string()
            })
            .collect();

        let mut table = CsvTable {
            headers,
            ..Default::default()
        };

        for (index, record) in rdr.records().enumerate() {
            match record {
                Ok(record) => table.rows.push(record.iter().map(str::to_string).collect()),
                Err(e) => {
                    log::debug!("skipping malformed CSV record {}: {}", index + 1, e);
                    table.malformed_rows += 1;
                }
            }
        }

        Ok(table)
    }
}
