use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// One raw current-weather payload, exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    /// File name or location id the payload came from.
    pub source_id: String,
    pub payload: Value,
}

impl RawObservation {
    /// Wrap an already decoded payload. Only JSON objects are accepted.
    pub fn from_value(source_id: impl Into<String>, payload: Value) -> Result<Self> {
        let source_id = source_id.into();
        if !payload.is_object() {
            return Err(PipelineError::parse(
                source_id,
                format!("expected a JSON object, found {}", json_kind(&payload)),
            ));
        }
        Ok(Self { source_id, payload })
    }

    /// Decode a payload from raw bytes (e.g. a bronze file).
    pub fn from_slice(source_id: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let source_id = source_id.into();
        let payload: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(e) => return Err(PipelineError::parse(source_id, e)),
        };
        Self::from_value(source_id, payload)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A configured location to fetch weather for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    /// Identifier used in bronze file names, e.g. `tel_aviv_il`.
    pub fn id(&self) -> String {
        format!("{}_{}", self.city, self.country)
            .to_lowercase()
            .replace(' ', "_")
    }

    /// Value of the `q` query parameter understood by OpenWeather.
    pub fn query(&self) -> String {
        format!("{},{}", self.city, self.country)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// Declared type of a column. Two records share a schema when their column
/// names and kinds match position by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Float,
    Integer,
    Text,
    Timestamp,
    Boolean,
    Duration,
}

/// A typed, nullable cell. `None` always means "absent in the source" or
/// "could not be derived".
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(Option<f64>),
    Integer(Option<i64>),
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
    Boolean(Option<bool>),
    Duration(Option<TimeDelta>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Duration(_) => FieldKind::Duration,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Float(v) => v.is_none(),
            FieldValue::Integer(v) => v.is_none(),
            FieldValue::Text(v) => v.is_none(),
            FieldValue::Timestamp(v) => v.is_none(),
            FieldValue::Boolean(v) => v.is_none(),
            FieldValue::Duration(v) => v.is_none(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => *v,
            FieldValue::Integer(v) => v.map(|i| i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => v.as_deref(),
            _ => None,
        }
    }

    /// Text used in the Silver CSV. Nulls render as an empty cell.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Float(Some(v)) => v.to_string(),
            FieldValue::Integer(Some(v)) => v.to_string(),
            FieldValue::Text(Some(v)) => v.clone(),
            FieldValue::Timestamp(Some(v)) => {
                v.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            }
            FieldValue::Boolean(Some(v)) => v.to_string(),
            FieldValue::Duration(Some(v)) => v.num_seconds().to_string(),
            _ => String::new(),
        }
    }
}

/// Flat, typed form of one observation. Temperatures are in Celsius.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    pub city_id: Option<i64>,
    pub city_name: Option<String>,
    pub country_code: Option<String>,
    pub coord_lon: Option<f64>,
    pub coord_lat: Option<f64>,
    pub timezone: Option<i64>,

    pub current_temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,

    pub weather_id: Option<i64>,
    pub weather_group: Option<String>,
    pub weather_description: Option<String>,
    pub weather_icon_code: Option<String>,

    pub atmospheric_pressure: Option<i64>,
    pub humidity_percentage: Option<i64>,
    pub sea_level_pressure: Option<i64>,
    pub ground_level_pressure: Option<i64>,

    pub wind_speed: Option<f64>,
    pub wind_direction: Option<i64>,

    pub visibility: Option<i64>,
    pub cloudiness_percentage: Option<i64>,
    pub rain_last_hour: Option<f64>,
    pub snow_last_hour: Option<f64>,

    pub data_time: Option<DateTime<Utc>>,
    pub sunrise_time: Option<DateTime<Utc>>,
    pub sunset_time: Option<DateTime<Utc>>,

    pub base: Option<String>,
    pub cod: Option<i64>,

    pub ingestion_timestamp: Option<DateTime<Utc>>,
}

impl NormalizedRecord {
    /// Internal schema keys, in declaration order.
    pub const FIELDS: &'static [&'static str] = &[
        "city_id",
        "city_name",
        "country_code",
        "coord_lon",
        "coord_lat",
        "timezone",
        "current_temp",
        "feels_like",
        "min_temp",
        "max_temp",
        "weather_id",
        "weather_group",
        "weather_description",
        "weather_icon_code",
        "atmospheric_pressure",
        "humidity_percentage",
        "sea_level_pressure",
        "ground_level_pressure",
        "wind_speed",
        "wind_direction",
        "visibility",
        "cloudiness_percentage",
        "rain_last_hour",
        "snow_last_hour",
        "data_time",
        "sunrise_time",
        "sunset_time",
        "base",
        "cod",
        "ingestion_timestamp",
    ];

    /// Look up a field by its internal key.
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        use FieldValue::*;

        let value = match key {
            "city_id" => Integer(self.city_id),
            "city_name" => Text(self.city_name.clone()),
            "country_code" => Text(self.country_code.clone()),
            "coord_lon" => Float(self.coord_lon),
            "coord_lat" => Float(self.coord_lat),
            "timezone" => Integer(self.timezone),
            "current_temp" => Float(self.current_temp),
            "feels_like" => Float(self.feels_like),
            "min_temp" => Float(self.min_temp),
            "max_temp" => Float(self.max_temp),
            "weather_id" => Integer(self.weather_id),
            "weather_group" => Text(self.weather_group.clone()),
            "weather_description" => Text(self.weather_description.clone()),
            "weather_icon_code" => Text(self.weather_icon_code.clone()),
            "atmospheric_pressure" => Integer(self.atmospheric_pressure),
            "humidity_percentage" => Integer(self.humidity_percentage),
            "sea_level_pressure" => Integer(self.sea_level_pressure),
            "ground_level_pressure" => Integer(self.ground_level_pressure),
            "wind_speed" => Float(self.wind_speed),
            "wind_direction" => Integer(self.wind_direction),
            "visibility" => Integer(self.visibility),
            "cloudiness_percentage" => Integer(self.cloudiness_percentage),
            "rain_last_hour" => Float(self.rain_last_hour),
            "snow_last_hour" => Float(self.snow_last_hour),
            "data_time" => Timestamp(self.data_time),
            "sunrise_time" => Timestamp(self.sunrise_time),
            "sunset_time" => Timestamp(self.sunset_time),
            "base" => Text(self.base.clone()),
            "cod" => Integer(self.cod),
            "ingestion_timestamp" => Timestamp(self.ingestion_timestamp),
            _ => return None,
        };

        Some(value)
    }
}

/// A named cell of an output row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub value: FieldValue,
}

impl Column {
    pub fn new(name: &'static str, value: FieldValue) -> Self {
        Self { name, value }
    }
}

/// A renamed and enriched record, ready for batch assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub source_id: String,
    pub columns: Vec<Column>,
}

impl OutputRecord {
    pub fn new(source_id: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            source_id: source_id.into(),
            columns,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    pub fn schema(&self) -> Vec<(&'static str, FieldKind)> {
        self.columns
            .iter()
            .map(|c| (c.name, c.value.kind()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_id_is_lowercase_snake() {
        let loc = Location::new("Tel Aviv", "IL");
        assert_eq!(loc.id(), "tel_aviv_il");
        assert_eq!(loc.query(), "Tel Aviv,IL");
    }

    #[test]
    fn raw_observation_rejects_non_objects() {
        let err = RawObservation::from_value("list.json", json!([1, 2])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("list.json"));
        assert!(msg.contains("an array"));
    }

    #[test]
    fn raw_observation_rejects_undecodable_bytes() {
        let err = RawObservation::from_slice("broken.json", b"{not json").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { ref source_id, .. } if source_id == "broken.json"));
    }

    #[test]
    fn every_declared_field_is_addressable() {
        let record = NormalizedRecord::default();
        for key in NormalizedRecord::FIELDS {
            let value = record.get(key).expect("declared field must resolve");
            assert!(value.is_null(), "{key} should default to null");
        }
        assert!(record.get("no_such_field").is_none());
    }

    #[test]
    fn render_leaves_nulls_empty() {
        assert_eq!(FieldValue::Float(None).render(), "");
        assert_eq!(FieldValue::Float(Some(8.0)).render(), "8");
        assert_eq!(FieldValue::Duration(Some(TimeDelta::seconds(40_000))).render(), "40000");
        let ts = DateTime::from_timestamp(1_700_000_000, 0);
        assert_eq!(FieldValue::Timestamp(ts).render(), "2023-11-14T22:13:20Z");
    }
}
