use crate::{Config, model::Location, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};
use tracing::{error, warn};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current-weather payload for `location`, exactly as the API returned it.
    async fn fetch_raw(&self, location: &Location) -> anyhow::Result<Value>;
}

/// How often to try a location before giving up on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Try `provider` up to `policy.attempts` times, sleeping between attempts
/// but not after the last one. Returns the last error.
pub async fn fetch_with_retry(
    provider: &dyn WeatherProvider,
    location: &Location,
    policy: RetryPolicy,
) -> anyhow::Result<Value> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match provider.fetch_raw(location).await {
            Ok(payload) => return Ok(payload),
            Err(e) if attempt < attempts => {
                warn!(
                    "Retry {attempt}/{attempts} for {location} in {}s: {e:#}",
                    policy.delay.as_secs()
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("Failed to fetch data for {location} after {attempts} attempts");
                return Err(e);
            }
        }
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: set OPENWEATHER_API_KEY or run `weather-pipeline configure`."
        )
    })?;

    let provider = OpenWeatherProvider::new(
        api_key.to_owned(),
        config.api.base_url.clone(),
        config.api.units.clone(),
        Duration::from_secs(config.api.timeout_secs),
    )?;

    Ok(Box::new(provider))
}
