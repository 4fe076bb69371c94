//! Extraction of the fixed field set from a raw OpenWeather payload.

use serde_json::Value;

use crate::model::RawObservation;

/// Raw, not-yet-coerced values for every schema field. `None` means the path
/// was missing (or explicitly `null`) somewhere along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReading {
    pub city_id: Option<Value>,
    pub city_name: Option<Value>,
    pub country_code: Option<Value>,
    pub coord_lon: Option<Value>,
    pub coord_lat: Option<Value>,
    pub timezone: Option<Value>,

    pub current_temp: Option<Value>,
    pub feels_like: Option<Value>,
    pub min_temp: Option<Value>,
    pub max_temp: Option<Value>,

    pub weather_id: Option<Value>,
    pub weather_group: Option<Value>,
    pub weather_description: Option<Value>,
    pub weather_icon_code: Option<Value>,

    pub atmospheric_pressure: Option<Value>,
    pub humidity_percentage: Option<Value>,
    pub sea_level_pressure: Option<Value>,
    pub ground_level_pressure: Option<Value>,

    pub wind_speed: Option<Value>,
    pub wind_direction: Option<Value>,

    pub visibility: Option<Value>,
    pub cloudiness_percentage: Option<Value>,
    pub rain_last_hour: Option<Value>,
    pub snow_last_hour: Option<Value>,

    pub data_time: Option<Value>,
    pub sunrise_time: Option<Value>,
    pub sunset_time: Option<Value>,

    pub base: Option<Value>,
    pub cod: Option<Value>,
}

/// Pull every schema field out of `raw`. Never fails: the payload is already
/// known to be an object, and any missing path just yields `None`.
pub fn parse(raw: &RawObservation) -> ParsedReading {
    let root = &raw.payload;
    let field = |path: &[&str]| lookup(root, path);
    let weather = |key: &str| {
        root.get("weather")
            .and_then(|w| w.get(0))
            .and_then(|w| w.get(key))
            .filter(|v| !v.is_null())
            .cloned()
    };

    ParsedReading {
        city_id: field(&["id"]),
        city_name: field(&["name"]),
        country_code: field(&["sys", "country"]),
        coord_lon: field(&["coord", "lon"]),
        coord_lat: field(&["coord", "lat"]),
        timezone: field(&["timezone"]),

        current_temp: field(&["main", "temp"]),
        feels_like: field(&["main", "feels_like"]),
        min_temp: field(&["main", "temp_min"]),
        max_temp: field(&["main", "temp_max"]),

        weather_id: weather("id"),
        weather_group: weather("main"),
        weather_description: weather("description"),
        weather_icon_code: weather("icon"),

        atmospheric_pressure: field(&["main", "pressure"]),
        humidity_percentage: field(&["main", "humidity"]),
        sea_level_pressure: field(&["main", "sea_level"]),
        ground_level_pressure: field(&["main", "grnd_level"]),

        wind_speed: field(&["wind", "speed"]),
        wind_direction: field(&["wind", "deg"]),

        visibility: field(&["visibility"]),
        cloudiness_percentage: field(&["clouds", "all"]),
        rain_last_hour: field(&["rain", "1h"]),
        snow_last_hour: field(&["snow", "1h"]),

        data_time: field(&["dt"]),
        sunrise_time: field(&["sys", "sunrise"]),
        sunset_time: field(&["sys", "sunset"]),

        base: field(&["base"]),
        cod: field(&["cod"]),
    }
}

/// Walk nested objects; a missing key or a non-object on the way gives `None`.
fn lookup(root: &Value, path: &[&str]) -> Option<Value> {
    path.iter()
        .try_fold(root, |node, key| node.as_object()?.get(*key))
        .filter(|v| !v.is_null())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(payload: Value) -> RawObservation {
        RawObservation::from_value("test.json", payload).expect("object payload")
    }

    #[test]
    fn extracts_nested_fields() {
        let parsed = parse(&raw(json!({
            "coord": {"lon": 34.88, "lat": 32.08},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "main": {"temp": 300.0, "grnd_level": 1010},
            "rain": {"1h": 0.25},
            "sys": {"country": "IL", "sunrise": 1700000000},
            "cod": 200
        })));

        assert_eq!(parsed.coord_lon, Some(json!(34.88)));
        assert_eq!(parsed.weather_group, Some(json!("Clear")));
        assert_eq!(parsed.weather_icon_code, Some(json!("01d")));
        assert_eq!(parsed.current_temp, Some(json!(300.0)));
        assert_eq!(parsed.ground_level_pressure, Some(json!(1010)));
        assert_eq!(parsed.rain_last_hour, Some(json!(0.25)));
        assert_eq!(parsed.country_code, Some(json!("IL")));
        assert_eq!(parsed.cod, Some(json!(200)));
    }

    #[test]
    fn missing_paths_yield_none() {
        let parsed = parse(&raw(json!({"main": {"temp": 12.5}})));

        assert_eq!(parsed.current_temp, Some(json!(12.5)));
        assert_eq!(parsed.min_temp, None);
        assert_eq!(parsed.sunrise_time, None);
        assert_eq!(parsed.snow_last_hour, None);
        assert_eq!(parsed.weather_group, None);
    }

    #[test]
    fn empty_weather_array_and_wrong_shapes_are_tolerated() {
        let parsed = parse(&raw(json!({
            "weather": [],
            "sys": "not-an-object",
            "wind": {"speed": null}
        })));

        assert_eq!(parsed.weather_id, None);
        assert_eq!(parsed.country_code, None);
        assert_eq!(parsed.wind_speed, None);
    }
}
