//! metricsheet-core: dashboard data generation from back-office exports
//!
//! The pipeline has three stages. Extractors turn revenue workbooks, KPI
//! workbooks and daily CSV feeds into four datasets; the reconciler fills
//! their gaps from the previous artifact; the writer renders the new artifact.
//! No stage fails the run: bad files, rows and previous declarations are logged
//! and skipped.

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod period;
pub mod reader;
pub mod reconcile;

use chrono::NaiveDateTime;
use std::path::Path;

pub use artifact::PreviousDatasets;
pub use config::MetricsheetConfig;
pub use dataset::{Dataset, DatasetKind, Datasets, Record};
pub use error::ArtifactError;
pub use extract::{FileOutcome, FileStatus, SourceExtractor};
pub use reconcile::{ReconcileReport, Reconciler};

/// Fresh datasets and per-file outcomes
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub datasets: Datasets,
    pub files: Vec<FileOutcome>,
}

/// What became of the previous artifact
#[derive(Debug, Clone, PartialEq)]
pub enum PreviousStatus {
    /// No previous artifact was supplied
    Missing,
    /// Parsed; `problems` declarations were unusable
    Loaded { datasets: usize, problems: usize },
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub datasets: Datasets,
    pub files: Vec<FileOutcome>,
    pub previous: PreviousStatus,
    pub reconcile: ReconcileReport,
    /// Rendered artifact, ready to be written
    pub artifact: String,
}

/// Main pipeline interface
pub struct Generator {
    config: MetricsheetConfig,
    extractors: Vec<Box<dyn SourceExtractor>>,
    reconciler: Reconciler,
}

impl Generator {
    /// Create a generator with default configuration
    pub fn new() -> Self {
        Self::with_config(MetricsheetConfig::default())
    }

    /// Create a generator with custom configuration
    pub fn with_config(config: MetricsheetConfig) -> Self {
        let extractors = extract::create_extractors(&config);
        let reconciler = Reconciler::new(&config.reconcile);
        Self {
            config,
            extractors,
            reconciler,
        }
    }

    pub fn config(&self) -> &MetricsheetConfig {
        &self.config
    }

    /// Run every extractor over `data_dir`
    pub fn extract(&self, data_dir: &Path) -> Extraction {
        let mut datasets = Datasets::default();
        let files = extract::extract_dir(&self.extractors, data_dir, &mut datasets);
        Extraction { datasets, files }
    }

    /// Full pipeline: extract, reconcile against `previous_artifact` (the
    /// text of the last output, if any) and render the new artifact.
    pub fn run(
        &self,
        data_dir: &Path,
        previous_artifact: Option<&str>,
        generated_at: NaiveDateTime,
    ) -> Result<RunOutcome, ArtifactError> {
        let Extraction {
            mut datasets,
            files,
        } = self.extract(data_dir);

        let (previous, status) = load_previous(previous_artifact);
        let reconcile = self.reconciler.reconcile(&mut datasets, previous.as_ref());
        let artifact = artifact::write_artifact(&datasets, generated_at)?;

        Ok(RunOutcome {
            datasets,
            files,
            previous: status,
            reconcile,
            artifact,
        })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse previous artifact text. Unusable declarations are counted and left
/// out; the rest stays available for reconciliation.
pub fn load_previous(text: Option<&str>) -> (Option<PreviousDatasets>, PreviousStatus) {
    let Some(text) = text else {
        return (None, PreviousStatus::Missing);
    };

    let previous = PreviousDatasets::parse(text);
    let status = PreviousStatus::Loaded {
        datasets: previous.len(),
        problems: previous.problems.len(),
    };
    (Some(previous), status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_previous_states() {
        assert_eq!(load_previous(None).1, PreviousStatus::Missing);

        let (previous, status) = load_previous(Some("const DSC_DATA = {};\n"));
        assert_eq!(previous.map(|p| p.len()), Some(1));
        assert_eq!(
            status,
            PreviousStatus::Loaded {
                datasets: 1,
                problems: 0
            }
        );

        let (previous, status) = load_previous(Some("const DSC_DATA = {};\nconst SLOTEN_DATA = {'open"));
        assert!(previous.is_some_and(|p| p.get(DatasetKind::Dsc).is_some()));
        assert_eq!(
            status,
            PreviousStatus::Loaded {
                datasets: 1,
                problems: 1
            }
        );
    }
}
