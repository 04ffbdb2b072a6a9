//! The dashboard artifact: a script of four `const` declarations whose
//! literals use single-quoted strings and 2-space indentation.
//!
//! [`write_artifact`] produces it and [`PreviousDatasets::parse`] reads it
//! back; the pair round-trips every dataset exactly.

pub mod parser;
pub mod writer;

use std::collections::BTreeMap;

use crate::dataset::{Dataset, DatasetKind};
use crate::error::ArtifactError;

pub use parser::{Declaration, parse_declarations};
pub use writer::{TIMESTAMP_FORMAT, to_literal, write_artifact};

/// Datasets recovered from a previous artifact
///
/// A dataset missing from the artifact, or one whose literal could not be
/// read, is simply absent; `problems` says why.
#[derive(Debug, Default)]
pub struct PreviousDatasets {
    datasets: BTreeMap<DatasetKind, Dataset>,
    pub problems: Vec<ArtifactError>,
}

impl PreviousDatasets {
    /// Read the datasets of an artifact. Each declaration stands alone: one
    /// that cannot be read ends up in `problems` and the others are kept.
    pub fn parse(text: &str) -> Self {
        let mut previous = PreviousDatasets::default();

        for declaration in parse_declarations(text) {
            let Some(name) = declaration.name else {
                if let Err(e) = declaration.literal {
                    log::warn!("unreadable declaration in previous artifact: {}", e);
                    previous.problems.push(e);
                }
                continue;
            };
            let Some(kind) = DatasetKind::from_const_name(&name) else {
                log::debug!("ignoring unknown declaration {}", name);
                continue;
            };

            let parsed = declaration.literal.and_then(|value| {
                serde_json::from_value::<Dataset>(value).map_err(|source| ArtifactError::Schema {
                    name: name.clone(),
                    source,
                })
            });

            match parsed {
                Ok(dataset) => {
                    previous.datasets.insert(kind, dataset);
                }
                Err(e) => {
                    log::warn!("previous {} unusable, not reconciling it: {}", kind, e);
                    previous.problems.push(e);
                }
            }
        }

        previous
    }

    pub fn get(&self, kind: DatasetKind) -> Option<&Dataset> {
        self.datasets.get(&kind)
    }

    pub fn insert(&mut self, kind: DatasetKind, dataset: Dataset) {
        self.datasets.insert(kind, dataset);
    }

    /// Number of datasets available for reconciliation
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
