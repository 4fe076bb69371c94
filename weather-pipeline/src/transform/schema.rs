//! Mapping from internal field keys to Silver column names.

use std::collections::HashSet;

use crate::error::{PipelineError, Result};
use crate::model::{Column, NormalizedRecord};

/// Internal key → output column. Order here is output column order.
pub const COLUMN_NAMES: &[(&str, &str)] = &[
    ("city_id", "City ID"),
    ("city_name", "City"),
    ("country_code", "Country"),
    ("coord_lon", "Longitude"),
    ("coord_lat", "Latitude"),
    ("current_temp", "Temperature"),
    ("feels_like", "Feels Like"),
    ("min_temp", "Minimum Temperature"),
    ("max_temp", "Maximum Temperature"),
    ("weather_id", "Weather ID"),
    ("weather_group", "Weather Group"),
    ("weather_description", "Weather Description"),
    ("atmospheric_pressure", "Pressure"),
    ("humidity_percentage", "Humidity"),
    ("sea_level_pressure", "Sea Level Pressure"),
    ("ground_level_pressure", "Ground Level Pressure"),
    ("wind_speed", "Wind Speed"),
    ("wind_direction", "Wind Direction"),
    ("visibility", "Visibility"),
    ("cloudiness_percentage", "Cloudiness"),
    ("rain_last_hour", "Rain Last Hour"),
    ("snow_last_hour", "Snow Last Hour"),
    ("data_time", "Time of Data"),
    ("sunrise_time", "Sunrise Time"),
    ("sunset_time", "Sunset Time"),
    ("ingestion_timestamp", "Ingestion Time"),
];

/// Fields with no analytical value: API plumbing and presentation hints.
pub const DROPPED_FIELDS: &[&str] = &["base", "cod", "timezone", "weather_icon_code"];

/// Validated rename table. Construct once at startup.
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    table: Vec<(&'static str, &'static str)>,
}

impl SchemaMapper {
    /// Mapper over the built-in tables.
    pub fn standard() -> Result<Self> {
        Self::new(COLUMN_NAMES, DROPPED_FIELDS)
    }

    /// Check that `table` and `dropped` together cover every field of
    /// [`NormalizedRecord`] exactly once and that column names are unique.
    pub fn new(
        table: &[(&'static str, &'static str)],
        dropped: &[&'static str],
    ) -> Result<Self> {
        let known: HashSet<&str> = NormalizedRecord::FIELDS.iter().copied().collect();
        let mut seen_keys = HashSet::new();
        let mut seen_columns = HashSet::new();

        for &(key, column) in table {
            if !known.contains(key) {
                return Err(PipelineError::config(format!(
                    "rename table refers to unknown field '{key}'"
                )));
            }
            if !seen_keys.insert(key) {
                return Err(PipelineError::config(format!(
                    "field '{key}' is mapped more than once"
                )));
            }
            if !seen_columns.insert(column) {
                return Err(PipelineError::config(format!(
                    "column name '{column}' is used by more than one field"
                )));
            }
        }

        for &key in dropped {
            if !known.contains(key) {
                return Err(PipelineError::config(format!(
                    "drop list refers to unknown field '{key}'"
                )));
            }
            if !seen_keys.insert(key) {
                return Err(PipelineError::config(format!(
                    "field '{key}' is both renamed and dropped"
                )));
            }
        }

        let missing: Vec<&str> = NormalizedRecord::FIELDS
            .iter()
            .copied()
            .filter(|k| !seen_keys.contains(k))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::config(format!(
                "rename table has no entry for: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            table: table.to_vec(),
        })
    }

    /// Renamed columns of `record`, in table order, without dropped fields.
    pub fn rename(&self, record: &NormalizedRecord) -> Vec<Column> {
        self.table
            .iter()
            .filter_map(|&(key, column)| record.get(key).map(|v| Column::new(column, v)))
            .collect()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|&(_, column)| column)
    }
}
