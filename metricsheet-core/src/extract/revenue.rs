//! Revenue-management workbook
//!
//! Data sheets carry a marker in their name; a suffix routes the sheet to the
//! DSC dataset instead of MOTO_AMUSE. Each row with a label and a numeric
//! value becomes one summary field.

use anyhow::Result;
use std::path::Path;

use super::{ExtractStats, SourceExtractor};
use crate::config::RevenueConfig;
use crate::dataset::{DatasetKind, Datasets, Fields, Record};
use crate::period;
use crate::reader::{self, Sheet, Workbook};

pub struct RevenueExtractor {
    config: RevenueConfig,
}

impl RevenueExtractor {
    pub fn new(config: &RevenueConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Extract every data sheet of an already loaded workbook
    pub fn extract_workbook(&self, workbook: &Workbook, datasets: &mut Datasets) -> ExtractStats {
        let mut stats = ExtractStats::default();

        for sheet in &workbook.sheets {
            if !sheet.name.contains(&self.config.sheet_marker) {
                continue;
            }

            let kind = self.dataset_for(&sheet.name);
            let period = period::from_marked_sheet_name(
                &sheet.name,
                &self.config.sheet_marker,
                &self.config.suffix,
            );
            let (fields, skipped) = self.scan_sheet(sheet);
            stats.skipped += skipped;

            if fields.is_empty() {
                log::debug!("sheet '{}' has no numeric rows", sheet.name);
                continue;
            }

            log::debug!("sheet '{}' -> {} {} ({} fields)", sheet.name, kind, period, fields.len());
            datasets
                .get_mut(kind)
                .insert(period, Record::with_summary(fields));
            stats.records += 1;
        }

        stats
    }

    fn dataset_for(&self, sheet_name: &str) -> DatasetKind {
        if !self.config.suffix.is_empty() && sheet_name.trim_end().ends_with(&self.config.suffix) {
            DatasetKind::Dsc
        } else {
            DatasetKind::MotoAmuse
        }
    }

    /// Label/value pairs of one sheet. A repeated label keeps the last value.
    fn scan_sheet(&self, sheet: &Sheet) -> (Fields, usize) {
        let mut fields = Fields::new();
        let mut skipped = 0;

        for row in 0..sheet.row_count() {
            let Some(label) = sheet.value(row, self.config.label_column).to_text() else {
                continue;
            };
            let label = label.trim();
            if label.is_empty() {
                continue;
            }

            let value = sheet.value(row, self.config.value_column);
            if value.is_empty() {
                continue;
            }
            match value.as_number() {
                Some(number) => {
                    fields.insert(label.to_string(), number);
                }
                None => skipped += 1,
            }
        }

        (fields, skipped)
    }
}

impl SourceExtractor for RevenueExtractor {
    fn id(&self) -> &str {
        "revenue"
    }

    fn name(&self) -> &str {
        "Revenue workbook"
    }

    fn patterns(&self) -> &[String] {
        &self.config.patterns
    }

    fn extract_file(&self, path: &Path, datasets: &mut Datasets) -> Result<ExtractStats> {
        let workbook = reader::read_workbook(path)?;
        Ok(self.extract_workbook(&workbook, datasets))
    }
}
