//! Error types for the Bronze to Silver transformation.
//!
//! Field-level coercion problems never show up here: they are absorbed by the
//! normalizer and become nulls. What remains are record-level, batch-level and
//! startup failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raw input that is not JSON, or JSON that is not an object.
    #[error("Failed to parse raw observation from {source_id}: {reason}")]
    Parse { source_id: String, reason: String },

    /// A record in a batch does not share the first record's columns.
    #[error("Schema mismatch in record {index} ({source_id}): {details}")]
    SchemaMismatch {
        index: usize,
        source_id: String,
        details: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Cannot assemble a batch from zero records")]
    EmptyBatch,
}

impl PipelineError {
    pub fn parse(source_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
