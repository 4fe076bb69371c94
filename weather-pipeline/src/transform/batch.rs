//! Assembly of output records into one table.

use chrono::{DateTime, Utc};

use crate::error::{PipelineError, Result};
use crate::model::{FieldKind, FieldValue, OutputRecord};

pub const PIPELINE_VERSION: &str = "Pipeline Version";
pub const DATA_SOURCE: &str = "Data Source";
pub const CREATED_BY: &str = "Created By";
pub const LOAD_DATETIME: &str = "Load Datetime";

/// Replacement for null text cells.
pub const UNKNOWN_TEXT: &str = "Unknown";

/// Run-level values appended to every row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMetadata {
    pub pipeline_version: String,
    pub data_source: String,
    pub created_by: String,
    pub load_datetime: DateTime<Utc>,
}

impl BatchMetadata {
    pub fn new(load_datetime: DateTime<Utc>) -> Self {
        Self {
            pipeline_version: env!("CARGO_PKG_VERSION").to_string(),
            data_source: "OpenWeatherMap API".to_string(),
            created_by: env!("CARGO_PKG_NAME").to_string(),
            load_datetime,
        }
    }

    fn columns(&self) -> [(&'static str, FieldValue); 4] {
        [
            (
                PIPELINE_VERSION,
                FieldValue::Text(Some(self.pipeline_version.clone())),
            ),
            (DATA_SOURCE, FieldValue::Text(Some(self.data_source.clone()))),
            (CREATED_BY, FieldValue::Text(Some(self.created_by.clone()))),
            (LOAD_DATETIME, FieldValue::Timestamp(Some(self.load_datetime))),
        ]
    }
}

/// A finished table: one header, rows in processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    columns: Vec<(&'static str, FieldKind)>,
    rows: Vec<Vec<FieldValue>>,
}

impl Batch {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|&(name, _)| name)
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` for column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&FieldValue> {
        let idx = self.columns.iter().position(|&(n, _)| n == name)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Check that every record shares the first record's schema, fill nulls and
/// append metadata. Either the whole batch is produced or nothing is.
pub fn assemble(records: Vec<OutputRecord>, metadata: &BatchMetadata) -> Result<Batch> {
    let first = records.first().ok_or(PipelineError::EmptyBatch)?;
    let schema = first.schema();

    for (index, record) in records.iter().enumerate().skip(1) {
        let other = record.schema();
        if other != schema {
            return Err(PipelineError::SchemaMismatch {
                index,
                source_id: record.source_id.clone(),
                details: describe_mismatch(&schema, &other),
            });
        }
    }

    let meta = metadata.columns();
    let mut columns = schema;
    columns.extend(meta.iter().map(|(name, value)| (*name, value.kind())));

    let rows = records
        .into_iter()
        .map(|record| {
            record
                .columns
                .into_iter()
                .map(|c| fill_null(c.value))
                .chain(meta.iter().map(|(_, value)| value.clone()))
                .collect()
        })
        .collect();

    Ok(Batch { columns, rows })
}

/// Null text becomes [`UNKNOWN_TEXT`], null numbers become zero. Timestamps,
/// flags and durations have no neutral value and stay null.
pub fn fill_null(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Text(None) => FieldValue::Text(Some(UNKNOWN_TEXT.to_string())),
        FieldValue::Float(None) => FieldValue::Float(Some(0.0)),
        FieldValue::Integer(None) => FieldValue::Integer(Some(0)),
        other => other,
    }
}

fn describe_mismatch(
    expected: &[(&'static str, FieldKind)],
    found: &[(&'static str, FieldKind)],
) -> String {
    let missing: Vec<&str> = expected
        .iter()
        .filter(|c| !found.contains(c))
        .map(|&(name, _)| name)
        .collect();
    let unexpected: Vec<&str> = found
        .iter()
        .filter(|c| !expected.contains(c))
        .map(|&(name, _)| name)
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return "columns are in a different order".to_string();
    }

    format!(
        "missing [{}], unexpected [{}]",
        missing.join(", "),
        unexpected.join(", ")
    )
}
