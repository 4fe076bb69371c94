//! Core library for the `weather-pipeline` tool.
//!
//! This crate defines:
//! - Configuration loading (TOML file plus environment override)
//! - The OpenWeather fetch collaborator and Bronze storage
//! - The Bronze to Silver transformation (parse, normalize, rename, derive, assemble)
//! - The Silver CSV writer
//!
//! It is used by `weather-pipeline-cli`, but the transform in [`transform`] is
//! pure and can be driven from anywhere.

pub mod bronze;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod provider;
pub mod silver;
pub mod transform;

pub use bronze::BronzeStore;
pub use config::Config;
pub use error::{PipelineError, Result};
pub use ingest::{IngestReport, ingest_locations};
pub use model::{FieldKind, FieldValue, Location, NormalizedRecord, OutputRecord, RawObservation};
pub use provider::{RetryPolicy, WeatherProvider, fetch_with_retry, provider_from_config};
pub use transform::{Batch, BatchMetadata, RunSummary, SilverPipeline, TransformReport};
