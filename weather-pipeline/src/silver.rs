//! Silver artifact writer.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;
use crate::transform::Batch;

pub fn file_name(at: DateTime<Utc>) -> String {
    format!("weather_silver_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Write `batch` as CSV into `dir`. The file only appears under its final
/// name once every row has been written.
pub fn write_batch(batch: &Batch, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::Writer::from_writer(tmp);

    writer.write_record(batch.column_names())?;
    for row in batch.rows() {
        writer.write_record(row.iter().map(|v| v.render()))?;
    }

    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    let path = dir.join(file_name(at));
    tmp.persist(&path).map_err(std::io::Error::from)?;

    info!("Saved {} records to {}", batch.len(), path.display());
    Ok(path)
}
