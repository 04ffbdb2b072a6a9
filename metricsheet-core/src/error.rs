//! Error types for the artifact format

use thiserror::Error;

/// Errors raised while writing or reading the dashboard artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// A string literal runs to the end of the input
    #[error("unterminated string starting at byte {offset}")]
    UnterminatedString { offset: usize },

    /// A block comment runs to the end of the input
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    /// The declaration grammar was not followed
    #[error("expected {expected} at byte {offset}")]
    Expected {
        expected: &'static str,
        offset: usize,
    },

    /// The literal assigned to a constant is not valid
    #[error("invalid literal for {name}: {source}")]
    Literal {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The literal parsed but does not have the dataset shape
    #[error("{name} does not match the dataset schema: {source}")]
    Schema {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a dataset failed
    #[error("failed to serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
