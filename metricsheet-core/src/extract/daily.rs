//! Daily-report CSV feed
//!
//! Unlike the workbooks, this dataset is additive: every dated row adds its
//! metric columns into the month the date falls in.

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use super::{ExtractStats, SourceExtractor};
use crate::config::DailyConfig;
use crate::dataset::{Dataset, Datasets};
use crate::period;
use crate::reader::{self, CsvTable};

pub struct DailyExtractor {
    config: DailyConfig,
}

impl DailyExtractor {
    pub fn new(config: &DailyConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Sum every dated row of `table` into `dataset`
    pub fn extract_table(&self, table: &CsvTable, dataset: &mut Dataset) -> ExtractStats {
        let mut stats = ExtractStats {
            skipped: table.malformed_rows,
            ..Default::default()
        };
        let mut touched = HashSet::new();
        let columns = metric_columns(&table.headers);

        for row in &table.rows {
            let Some(period) = row.first().and_then(|d| period::from_date_text(d)) else {
                stats.skipped += 1;
                continue;
            };

            let record = dataset.entry(period.clone()).or_default();
            touched.insert(period);

            for (index, column) in &columns {
                match row.get(*index).and_then(|cell| parse_number(cell)) {
                    Some(value) => record.accumulate(column, value),
                    None => stats.skipped += 1,
                }
            }
        }

        stats.records = touched.len();
        stats
    }
}

/// Every column after the date, with generated names for blank headers
fn metric_columns(headers: &[String]) -> Vec<(usize, String)> {
    headers
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, h)| {
            if h.is_empty() {
                (i, format!("Unnamed: {}", i))
            } else {
                (i, h.clone())
            }
        })
        .collect()
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl SourceExtractor for DailyExtractor {
    fn id(&self) -> &str {
        "daily"
    }

    fn name(&self) -> &str {
        "Daily CSV feed"
    }

    fn patterns(&self) -> &[String] {
        &self.config.patterns
    }

    fn extract_file(&self, path: &Path, datasets: &mut Datasets) -> Result<ExtractStats> {
        let table = reader::read_csv(path)?;
        Ok(self.extract_table(&table, &mut datasets.konibet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str, dataset: &mut Dataset) -> ExtractStats {
        let table = CsvTable::from_reader(content.as_bytes()).unwrap();
        DailyExtractor::new(&DailyConfig::default()).extract_table(&table, dataset)
    }

    #[test]
    fn test_rows_in_same_month_are_summed() {
        let mut dataset = Dataset::new();
        let stats = extract("date,deposits\n2024-03-01,100\n2024-03-15,150\n", &mut dataset);

        assert_eq!(dataset["2024年3月"].summary["deposits"], 250.0);
        assert_eq!(stats.records, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn test_rows_split_by_month() {
        let mut dataset = Dataset::new();
        extract(
            "日期,deposits,withdrawals\n2024/02/28,10,1\n2024/03/01,20,2\n",
            &mut dataset,
        );

        assert_eq!(dataset["2024年2月"].summary["deposits"], 10.0);
        assert_eq!(dataset["2024年3月"].summary["withdrawals"], 2.0);
    }

    #[test]
    fn test_undated_and_non_numeric_are_skipped() {
        let mut dataset = Dataset::new();
        let stats = extract(
            "date,deposits,note\n合計,999,x\n2024-03-01,abc,\n2024-03-02,5,NaN\n",
            &mut dataset,
        );

        assert_eq!(dataset.len(), 1);
        let summary = &dataset["2024年3月"].summary;
        assert_eq!(summary["deposits"], 5.0);
        assert!(!summary.contains_key("note"));
        // one undated row, then "abc", "", "NaN"
        assert_eq!(stats.skipped, 4);
    }

    #[test]
    fn test_dated_row_without_numbers_creates_period() {
        let mut dataset = Dataset::new();
        extract("date,deposits\n2024-04-01,\n", &mut dataset);

        assert!(dataset["2024年4月"].summary.is_empty());
    }

    #[test]
    fn test_accumulates_across_files() {
        let mut dataset = Dataset::new();
        extract("date,deposits\n2024-03-01,100\n", &mut dataset);
        extract("date,deposits,bonus\n2024-03-20,1.5,7\n", &mut dataset);

        let summary = &dataset["2024年3月"].summary;
        assert_eq!(summary["deposits"], 101.5);
        assert_eq!(summary["bonus"], 7.0);
    }

    #[test]
    fn test_blank_header_gets_generated_name() {
        let mut dataset = Dataset::new();
        extract("date,,deposits\n2024-03-01,3,4\n", &mut dataset);

        assert_eq!(dataset["2024年3月"].summary["Unnamed: 1"], 3.0);
    }
}
