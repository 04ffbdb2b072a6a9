//! Source extractors
//!
//! Each source system is one [`SourceExtractor`]. The registry builds them
//! from configuration; the pipeline discovers matching files and hands each
//! one to its extractor, isolating failures per file.

pub mod daily;
pub mod kpi;
pub mod revenue;

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MetricsheetConfig;
use crate::dataset::Datasets;

/// Trait that all source extractors must implement
pub trait SourceExtractor {
    /// Short identifier (e.g., "kpi")
    fn id(&self) -> &str;

    /// Human-readable source name
    fn name(&self) -> &str;

    /// File-name wildcard patterns this source claims
    fn patterns(&self) -> &[String];

    /// Extract one file into the datasets
    fn extract_file(&self, path: &Path, datasets: &mut Datasets) -> Result<ExtractStats>;
}

/// What one file contributed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Period records written or updated
    pub records: usize,
    /// Rows or cells dropped during coercion
    pub skipped: usize,
}

/// Result of processing one discovered file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub source: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Extracted(ExtractStats),
    Failed(String),
}

/// Create all extractors in processing order
pub fn create_extractors(config: &MetricsheetConfig) -> Vec<Box<dyn SourceExtractor>> {
    vec![
        Box::new(revenue::RevenueExtractor::new(&config.revenue)),
        Box::new(kpi::KpiExtractor::new(&config.kpi)),
        Box::new(daily::DailyExtractor::new(&config.daily)),
    ]
}

/// Run every extractor over the files it claims in `dir`
///
/// A missing directory or a failing file is logged and recorded in the
/// outcomes; it never stops the run.
pub fn extract_dir(
    extractors: &[Box<dyn SourceExtractor>],
    dir: &Path,
    datasets: &mut Datasets,
) -> Vec<FileOutcome> {
    let mut outcomes = Vec::new();

    for extractor in extractors {
        let files = match discover(dir, extractor.patterns()) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("{}: {:#}", extractor.name(), e);
                continue;
            }
        };

        for path in files {
            log::info!("{}: processing {}", extractor.name(), path.display());
            let status = match extractor.extract_file(&path, datasets) {
                Ok(stats) => {
                    log::info!(
                        "{}: {} records from {} ({} skipped)",
                        extractor.name(),
                        stats.records,
                        path.display(),
                        stats.skipped
                    );
                    FileStatus::Extracted(stats)
                }
                Err(e) => {
                    log::error!("{}: {:#}", extractor.name(), e);
                    FileStatus::Failed(format!("{:#}", e))
                }
            };
            outcomes.push(FileOutcome {
                path,
                source: extractor.id().to_string(),
                status,
            });
        }
    }

    outcomes
}

/// Files directly inside `dir` whose name matches any pattern, sorted
pub fn discover(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let matchers = patterns
        .iter()
        .map(|p| wildcard_regex(p))
        .collect::<Result<Vec<_>>>()?;

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read data directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        // Office lock files share the workbook's name
        if name.starts_with("~$") || !entry.file_type()?.is_file() {
            continue;
        }
        if matchers.iter().any(|m| m.is_match(name)) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Translate a `*`/`?` file-name pattern into an anchored regex
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::from("^");
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');
    Regex::new(&source).with_context(|| format!("Invalid file pattern: {}", pattern))
}
