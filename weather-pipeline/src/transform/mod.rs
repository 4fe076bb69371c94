//! Bronze to Silver transformation.
//!
//! One raw observation flows through [`parser`], [`normalizer`], [`schema`]
//! and [`derived`] independently of every other observation; [`batch`] then
//! joins the results into a single table.

pub mod batch;
pub mod derived;
pub mod normalizer;
pub mod parser;
pub mod schema;

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::bronze::BronzeStore;
use crate::error::{PipelineError, Result};
use crate::model::{OutputRecord, RawObservation};
use crate::silver;

pub use batch::{Batch, BatchMetadata, assemble};
pub use derived::DerivedFields;
pub use schema::SchemaMapper;

/// A per-file problem that did not stop the run.
#[derive(Debug, Clone, PartialEq)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of transforming a bronze directory.
#[derive(Debug, Default)]
pub struct TransformReport {
    pub records: Vec<OutputRecord>,
    pub successful: usize,
    pub failed: usize,
    /// Files that were not JSON at all.
    pub skipped: usize,
    pub errors: Vec<FileError>,
}

impl TransformReport {
    fn record_error(&mut self, path: &Path, message: impl ToString) {
        self.errors.push(FileError {
            path: path.to_path_buf(),
            message: message.to_string(),
        });
    }
}

/// Outcome of a full Bronze to Silver run.
#[derive(Debug)]
pub struct RunSummary {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<FileError>,
    /// `None` when there was nothing to write.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SilverPipeline {
    mapper: SchemaMapper,
}

impl SilverPipeline {
    /// Validates the rename table; fails before any record is touched.
    pub fn new() -> Result<Self> {
        Ok(Self::with_mapper(SchemaMapper::standard()?))
    }

    pub fn with_mapper(mapper: SchemaMapper) -> Self {
        Self { mapper }
    }

    /// Transform one observation, stamping it with the current time.
    pub fn process(&self, raw: &RawObservation) -> OutputRecord {
        self.process_at(raw, Utc::now())
    }

    pub fn process_at(&self, raw: &RawObservation, now: DateTime<Utc>) -> OutputRecord {
        let parsed = parser::parse(raw);
        let normalized = normalizer::normalize(&parsed, now);

        let mut columns = self.mapper.rename(&normalized);
        columns.extend(DerivedFields::compute(&normalized).into_columns());

        OutputRecord::new(raw.source_id.clone(), columns)
    }

    /// Transform every file in `bronze_dir`. Per-file problems are recorded
    /// in the report; only failure to list the directory is an error.
    pub fn process_directory(&self, bronze_dir: &Path) -> anyhow::Result<TransformReport> {
        let files = BronzeStore::new(bronze_dir).list()?;
        let mut report = TransformReport::default();

        if files.is_empty() {
            warn!("No JSON files found in {}", bronze_dir.display());
            return Ok(report);
        }

        info!("Found {} files to process", files.len());

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                warn!("Skipping non-JSON file {name}");
                report.skipped += 1;
                report.record_error(&path, "not a JSON file");
                continue;
            }

            info!("Processing {name}");
            let raw = fs::read(&path)
                .map_err(PipelineError::from)
                .and_then(|bytes| RawObservation::from_slice(name.as_str(), &bytes));

            match raw {
                Ok(raw) => {
                    report.records.push(self.process(&raw));
                    report.successful += 1;
                }
                Err(e) => {
                    error!("Error processing {name}: {e}");
                    report.failed += 1;
                    report.record_error(&path, e);
                }
            }
        }

        Ok(report)
    }

    /// Transform `bronze_dir` and write one Silver CSV into `silver_dir`.
    pub fn run(
        &self,
        bronze_dir: &Path,
        silver_dir: &Path,
        metadata: &BatchMetadata,
    ) -> anyhow::Result<RunSummary> {
        let report = self.process_directory(bronze_dir)?;

        let output = if report.records.is_empty() {
            warn!("No records to write; Silver output skipped");
            None
        } else {
            let batch = assemble(report.records, metadata)?;
            Some(silver::write_batch(&batch, silver_dir, metadata.load_datetime)?)
        };

        info!(
            "Transformation complete: {} successful, {} failed",
            report.successful, report.failed
        );

        Ok(RunSummary {
            successful: report.successful,
            failed: report.failed,
            skipped: report.skipped,
            errors: report.errors,
            output,
        })
    }
}
