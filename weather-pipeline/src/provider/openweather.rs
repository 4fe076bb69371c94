use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::model::Location;

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, units: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url,
            units,
            http,
        })
    }

    async fn fetch_current(&self, location: &Location) -> Result<Value> {
        info!("Fetching weather data for {location}");

        let query = location.query();
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather for {location}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather current request for {} failed with status {}: {}",
                location,
                status,
                truncate_body(&body),
            ));
        }

        let parsed: Value =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        if !parsed.is_object() {
            return Err(anyhow!(
                "OpenWeather returned a non-object payload for {}: {}",
                location,
                truncate_body(&body),
            ));
        }

        info!("Successfully fetched data for {location}");
        Ok(parsed)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_raw(&self, location: &Location) -> Result<Value> {
        self.fetch_current(location).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
