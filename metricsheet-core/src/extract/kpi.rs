//! KPI workbook
//!
//! One sheet per month, named `YYYYMM`. The summary comes from a bounded
//! label/value scan, followed by derived ratios, a placeholder field and two
//! payment-method tables.

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use super::{ExtractStats, SourceExtractor};
use crate::config::{KpiConfig, MethodTableConfig};
use crate::dataset::{Breakdown, Datasets, Fields, Record, groups};
use crate::period;
use crate::reader::{self, Sheet, Workbook};

/// Sub-field names of a payment-method row
pub mod method_fields {
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const TOTAL_COUNT: &str = "total_count";
    pub const AVERAGE_AMOUNT: &str = "average_amount";
    pub const MEDIAN_AMOUNT: &str = "median_amount";
}

pub struct KpiExtractor {
    config: KpiConfig,
}

impl KpiExtractor {
    pub fn new(config: &KpiConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Extract every `YYYYMM` sheet of an already loaded workbook
    pub fn extract_workbook(&self, workbook: &Workbook, datasets: &mut Datasets) -> ExtractStats {
        let mut stats = ExtractStats::default();

        for sheet in &workbook.sheets {
            let Some(period) = period::from_year_month_name(&sheet.name) else {
                continue;
            };
            let (record, skipped) = self.extract_sheet(sheet);
            stats.skipped += skipped;

            if let Some(record) = record {
                log::debug!("sheet '{}' -> {} ({} fields)", sheet.name, period, record.summary.len());
                datasets.sloten.insert(period, record);
                stats.records += 1;
            } else {
                log::debug!("sheet '{}' has no KPI rows", sheet.name);
            }
        }

        stats
    }

    /// Build the record for one month sheet; `None` when the scan finds no
    /// summary field.
    pub fn extract_sheet(&self, sheet: &Sheet) -> (Option<Record>, usize) {
        let (mut summary, skipped) = self.scan_summary(sheet);
        if summary.is_empty() {
            return (None, skipped);
        }

        self.apply_derived(&mut summary);

        let mut record = Record::with_summary(summary);
        for (group, table) in [
            (groups::WITHDRAWAL_METHODS, &self.config.withdrawal_methods),
            (groups::DEPOSIT_METHODS, &self.config.deposit_methods),
        ] {
            let breakdown = self.read_method_table(sheet, table);
            if !breakdown.is_empty() {
                record.breakdowns.insert(group.to_string(), breakdown);
            }
        }

        (Some(record), skipped)
    }

    fn scan_summary(&self, sheet: &Sheet) -> (Fields, usize) {
        let mut summary = Fields::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut skipped = 0;

        // Configured rows are 1-based and inclusive
        let first = self.config.first_row.saturating_sub(1);
        let last = self.config.last_row.min(sheet.row_count());

        for row in first..last {
            let Some(label) = normalize_label(sheet.value(row, self.config.label_column)) else {
                continue;
            };
            let value = sheet.value(row, self.config.value_column);
            if value.is_empty() {
                continue;
            }
            let Some(number) = value.as_number() else {
                skipped += 1;
                continue;
            };

            // Numbers mis-read as labels render as "0.xx"
            if self
                .config
                .rejected_prefixes
                .iter()
                .any(|prefix| label.starts_with(prefix.as_str()))
            {
                continue;
            }

            if let Some(&pinned_row) = self.config.pinned_labels.get(&label) {
                if pinned_row != row + 1 {
                    continue;
                }
            }

            if seen.insert(label.clone()) {
                summary.insert(label, number);
            }
        }

        (summary, skipped)
    }

    fn apply_derived(&self, summary: &mut Fields) {
        for ratio in &self.config.ratios {
            let numerator = summary.get(&ratio.numerator).copied().unwrap_or(0.0);
            let denominator = summary
                .get(&ratio.denominator)
                .copied()
                .filter(|d| *d != 0.0)
                .unwrap_or(1.0);
            summary.insert(ratio.name.clone(), numerator / denominator);
        }

        // TODO: replace with the real conversion rate once the KPI export carries it
        let placeholder = &self.config.placeholder;
        summary.insert(placeholder.name.clone(), placeholder.value);
    }

    fn read_method_table(&self, sheet: &Sheet, table: &MethodTableConfig) -> Breakdown {
        let mut breakdown = Breakdown::new();
        let name_col = self.config.label_column;
        let number = |row: u32, offset: u32| sheet.value(row, name_col + offset).as_number().unwrap_or(0.0);

        for row in table.first_row.saturating_sub(1)..table.last_row {
            let Some(name) = sheet.value(row, name_col).to_text() else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let fields = Fields::from([
                (method_fields::TOTAL_AMOUNT.to_string(), number(row, 1)),
                (method_fields::TOTAL_COUNT.to_string(), number(row, 2)),
                (method_fields::AVERAGE_AMOUNT.to_string(), number(row, 3).round()),
                (method_fields::MEDIAN_AMOUNT.to_string(), number(row, 4)),
            ]);
            breakdown.insert(name.to_string(), fields);
        }

        breakdown
    }
}

/// Label text: trimmed, cut at the first `/`, trimmed again
fn normalize_label(cell: &reader::CellValue) -> Option<String> {
    let text = cell.to_text()?;
    let label = text.trim().split('/').next().unwrap_or_default().trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

impl SourceExtractor for KpiExtractor {
    fn id(&self) -> &str {
        "kpi"
    }

    fn name(&self) -> &str {
        "KPI workbook"
    }

    fn patterns(&self) -> &[String] {
        &self.config.patterns
    }

    fn extract_file(&self, path: &Path, datasets: &mut Datasets) -> Result<ExtractStats> {
        let workbook = reader::read_workbook(path)?;
        Ok(self.extract_workbook(&workbook, datasets))
    }
}
