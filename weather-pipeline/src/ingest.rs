//! Fetch every configured location and land the payloads in bronze storage.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{error, info};

use crate::bronze::BronzeStore;
use crate::model::Location;
use crate::provider::{RetryPolicy, WeatherProvider, fetch_with_retry};

#[derive(Debug, Default)]
pub struct IngestReport {
    pub successful: usize,
    pub failed: usize,
    pub files: Vec<PathBuf>,
}

/// A failed location is counted and skipped; it never reaches the transform.
pub async fn ingest_locations(
    provider: &dyn WeatherProvider,
    locations: &[Location],
    store: &BronzeStore,
    policy: RetryPolicy,
) -> IngestReport {
    let mut report = IngestReport::default();

    info!("Starting ingestion for {} locations", locations.len());

    for location in locations {
        let saved = match fetch_with_retry(provider, location, policy).await {
            Ok(payload) => store.save(&location.id(), &payload, Utc::now()),
            Err(e) => Err(e),
        };

        match saved {
            Ok(path) => {
                report.files.push(path);
                report.successful += 1;
            }
            Err(e) => {
                error!("Ingestion failed for {location}: {e:#}");
                report.failed += 1;
            }
        }
    }

    info!(
        "Ingestion complete: {} successful, {} failed",
        report.successful, report.failed
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::FlakyProvider;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn saves_each_successful_location() {
        let dir = TempDir::new().unwrap();
        let store = BronzeStore::new(dir.path());
        let provider = FlakyProvider::failing(0);
        let locations = [Location::new("Tel Aviv", "IL"), Location::new("Haifa", "IL")];

        let report = ingest_locations(&provider, &locations, &store, RetryPolicy::default()).await;

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 0);
        let names: Vec<_> = report
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names[0].starts_with("weather_tel_aviv_il_"));
        assert!(names[1].starts_with("weather_haifa_il_"));
    }

    #[tokio::test]
    async fn failed_locations_are_counted_not_saved() {
        let dir = TempDir::new().unwrap();
        let store = BronzeStore::new(dir.path());
        let provider = FlakyProvider::failing(u32::MAX);
        let policy = RetryPolicy {
            attempts: 2,
            delay: Duration::ZERO,
        };

        let report =
            ingest_locations(&provider, &[Location::new("Eilat", "IL")], &store, policy).await;

        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 1);
        assert!(store.list().unwrap().is_empty());
    }
}
