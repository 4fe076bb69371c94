//! Quantities computed from a normalized record.
//!
//! Each derived value is `None` when any of its inputs is missing, except the
//! weather category which always resolves to a label.

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::{Column, FieldValue, NormalizedRecord};

pub const TEMPERATURE_RANGE: &str = "Temperature Range";
pub const DAY_LENGTH: &str = "Day Length";
pub const IS_DAYTIME: &str = "Is Daytime";
pub const WEATHER_CATEGORY: &str = "Weather Category";
pub const TEMPERATURE_FAHRENHEIT: &str = "Temperature in Fahrenheit";
pub const VISIBILITY_KM: &str = "Visibility in KM";

/// Category for any weather group not in the table.
pub const OTHER_CATEGORY: &str = "Other";

const WEATHER_CATEGORIES: &[(&str, &str)] = &[
    ("Clear", "Clear"),
    ("Clouds", "Cloudy"),
    ("Rain", "Rain"),
    ("Drizzle", "Rain"),
    ("Thunderstorm", "Storm"),
    ("Snow", "Snow"),
    ("Mist", "Low Visibility"),
    ("Fog", "Low Visibility"),
    ("Haze", "Low Visibility"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub temperature_range: Option<f64>,
    pub day_length: Option<TimeDelta>,
    pub is_daytime: Option<bool>,
    pub weather_category: &'static str,
    pub temperature_fahrenheit: Option<f64>,
    pub visibility_km: Option<f64>,
}

impl DerivedFields {
    pub fn compute(record: &NormalizedRecord) -> Self {
        Self {
            temperature_range: temperature_range(record.min_temp, record.max_temp),
            day_length: day_length(record.sunrise_time, record.sunset_time),
            is_daytime: is_daytime(record.data_time, record.sunrise_time, record.sunset_time),
            weather_category: weather_category(record.weather_group.as_deref()),
            temperature_fahrenheit: record.current_temp.map(celsius_to_fahrenheit),
            visibility_km: record.visibility.map(|m| m as f64 / 1000.0),
        }
    }

    /// Columns in output order.
    pub fn into_columns(self) -> Vec<Column> {
        vec![
            Column::new(TEMPERATURE_RANGE, FieldValue::Float(self.temperature_range)),
            Column::new(DAY_LENGTH, FieldValue::Duration(self.day_length)),
            Column::new(IS_DAYTIME, FieldValue::Boolean(self.is_daytime)),
            Column::new(
                WEATHER_CATEGORY,
                FieldValue::Text(Some(self.weather_category.to_string())),
            ),
            Column::new(
                TEMPERATURE_FAHRENHEIT,
                FieldValue::Float(self.temperature_fahrenheit),
            ),
            Column::new(VISIBILITY_KM, FieldValue::Float(self.visibility_km)),
        ]
    }
}

pub fn temperature_range(min: Option<f64>, max: Option<f64>) -> Option<f64> {
    Some(max? - min?)
}

pub fn day_length(
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
) -> Option<TimeDelta> {
    Some(sunset? - sunrise?)
}

/// Half-open interval: a reading taken exactly at sunset is night.
pub fn is_daytime(
    at: Option<DateTime<Utc>>,
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
) -> Option<bool> {
    let (at, sunrise, sunset) = (at?, sunrise?, sunset?);
    Some(at >= sunrise && at < sunset)
}

/// Total over all inputs; unknown or missing groups map to [`OTHER_CATEGORY`].
pub fn weather_category(group: Option<&str>) -> &'static str {
    group
        .and_then(|g| {
            WEATHER_CATEGORIES
                .iter()
                .find(|(label, _)| *label == g)
                .map(|&(_, category)| category)
        })
        .unwrap_or(OTHER_CATEGORY)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(secs, 0)
    }

    #[test]
    fn range_and_day_length() {
        assert_eq!(temperature_range(Some(21.85), Some(31.85)).map(|r| r.round()), Some(10.0));
        assert_eq!(temperature_range(None, Some(31.85)), None);

        let len = day_length(ts(1_700_000_000), ts(1_700_040_000)).unwrap();
        assert_eq!(len.num_seconds(), 40_000);
        assert_eq!(day_length(None, ts(1_700_040_000)), None);
    }

    #[test]
    fn daytime_is_half_open() {
        let (rise, set) = (ts(1_000), ts(2_000));
        assert_eq!(is_daytime(ts(1_000), rise, set), Some(true));
        assert_eq!(is_daytime(ts(1_999), rise, set), Some(true));
        assert_eq!(is_daytime(ts(2_000), rise, set), Some(false));
        assert_eq!(is_daytime(ts(999), rise, set), Some(false));
        assert_eq!(is_daytime(ts(1_500), None, set), None);
        assert_eq!(is_daytime(None, rise, set), None);
    }

    #[test]
    fn weather_category_is_total() {
        assert_eq!(weather_category(Some("Clear")), "Clear");
        assert_eq!(weather_category(Some("Clouds")), "Cloudy");
        assert_eq!(weather_category(Some("Drizzle")), "Rain");
        assert_eq!(weather_category(Some("Thunderstorm")), "Storm");
        assert_eq!(weather_category(Some("Haze")), "Low Visibility");
        assert_eq!(weather_category(Some("Fog")), "Low Visibility");
        assert_eq!(weather_category(Some("Tornado")), OTHER_CATEGORY);
        assert_eq!(weather_category(Some("")), OTHER_CATEGORY);
        assert_eq!(weather_category(None), OTHER_CATEGORY);
    }

    #[test]
    fn fahrenheit_matches_formula() {
        for c in [-40.0, 0.0, 26.85, 37.0, 100.0] {
            assert!((celsius_to_fahrenheit(c) - (c * 9.0 / 5.0 + 32.0)).abs() < 1e-9);
        }
        assert!((celsius_to_fahrenheit(-40.0) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn missing_sunrise_propagates() {
        let record = NormalizedRecord {
            data_time: ts(1_700_020_000),
            sunset_time: ts(1_700_040_000),
            visibility: Some(8000),
            ..Default::default()
        };

        let derived = DerivedFields::compute(&record);
        assert_eq!(derived.day_length, None);
        assert_eq!(derived.is_daytime, None);
        assert_eq!(derived.temperature_fahrenheit, None);
        assert_eq!(derived.visibility_km, Some(8.0));
        assert_eq!(derived.weather_category, OTHER_CATEGORY);
    }

    #[test]
    fn columns_are_in_fixed_order() {
        let names: Vec<_> = DerivedFields::compute(&NormalizedRecord::default())
            .into_columns()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            [
                TEMPERATURE_RANGE,
                DAY_LENGTH,
                IS_DAYTIME,
                WEATHER_CATEGORY,
                TEMPERATURE_FAHRENHEIT,
                VISIBILITY_KM
            ]
        );
    }
}
