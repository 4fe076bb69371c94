//! Unit conversion and type coercion.
//!
//! Coercion never fails: a value that does not fit its declared type becomes
//! `None` and is logged at debug level.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::parser::ParsedReading;
use crate::model::NormalizedRecord;

/// Readings above this are assumed to be Kelvin.
pub const KELVIN_THRESHOLD: f64 = 100.0;

/// Offset between the Kelvin and Celsius scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// The provider may return Kelvin (no `units` parameter) or Celsius
/// (`units=metric`) and the payload does not say which. Anything above
/// [`KELVIN_THRESHOLD`] is taken to be Kelvin.
///
/// Not idempotent: a Kelvin value that is still above the threshold after
/// conversion (anything over 373.15) is converted again on a second pass.
pub fn kelvin_heuristic_to_celsius(value: f64) -> f64 {
    if value > KELVIN_THRESHOLD {
        value - KELVIN_OFFSET
    } else {
        value
    }
}

/// Coerce a parsed reading into a [`NormalizedRecord`], stamping
/// `ingestion_timestamp` with `now`.
pub fn normalize(parsed: &ParsedReading, now: DateTime<Utc>) -> NormalizedRecord {
    let temp = |name: &str, v: &Option<Value>| {
        coerce_float(name, v.as_ref()).map(kelvin_heuristic_to_celsius)
    };
    let float = |name: &str, v: &Option<Value>| coerce_float(name, v.as_ref());
    let int = |name: &str, v: &Option<Value>| coerce_integer(name, v.as_ref());
    let text = |name: &str, v: &Option<Value>| coerce_text(name, v.as_ref());
    let epoch = |name: &str, v: &Option<Value>| coerce_epoch(name, v.as_ref());

    NormalizedRecord {
        city_id: int("city_id", &parsed.city_id),
        city_name: text("city_name", &parsed.city_name),
        country_code: text("country_code", &parsed.country_code),
        coord_lon: float("coord_lon", &parsed.coord_lon),
        coord_lat: float("coord_lat", &parsed.coord_lat),
        timezone: int("timezone", &parsed.timezone),

        current_temp: temp("current_temp", &parsed.current_temp),
        feels_like: temp("feels_like", &parsed.feels_like),
        min_temp: temp("min_temp", &parsed.min_temp),
        max_temp: temp("max_temp", &parsed.max_temp),

        weather_id: int("weather_id", &parsed.weather_id),
        weather_group: text("weather_group", &parsed.weather_group),
        weather_description: text("weather_description", &parsed.weather_description),
        weather_icon_code: text("weather_icon_code", &parsed.weather_icon_code),

        atmospheric_pressure: int("atmospheric_pressure", &parsed.atmospheric_pressure),
        humidity_percentage: int("humidity_percentage", &parsed.humidity_percentage),
        sea_level_pressure: int("sea_level_pressure", &parsed.sea_level_pressure),
        ground_level_pressure: int("ground_level_pressure", &parsed.ground_level_pressure),

        wind_speed: float("wind_speed", &parsed.wind_speed),
        wind_direction: int("wind_direction", &parsed.wind_direction),

        visibility: int("visibility", &parsed.visibility),
        cloudiness_percentage: int("cloudiness_percentage", &parsed.cloudiness_percentage),
        rain_last_hour: float("rain_last_hour", &parsed.rain_last_hour),
        snow_last_hour: float("snow_last_hour", &parsed.snow_last_hour),

        data_time: epoch("data_time", &parsed.data_time),
        sunrise_time: epoch("sunrise_time", &parsed.sunrise_time),
        sunset_time: epoch("sunset_time", &parsed.sunset_time),

        base: text("base", &parsed.base),
        cod: int("cod", &parsed.cod),

        ingestion_timestamp: Some(now),
    }
}

/// Numbers and numeric strings become `f64`.
pub fn coerce_float(field: &str, value: Option<&Value>) -> Option<f64> {
    let value = value?;
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    };
    if coerced.is_none() {
        debug!("Could not coerce {field}={value} to float; using null");
    }
    coerced
}

/// Integers, integral floats and strings holding either become `i64`.
/// Fractional values become `None` rather than being truncated.
pub fn coerce_integer(field: &str, value: Option<&Value>) -> Option<i64> {
    let value = value?;
    let coerced = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    if coerced.is_none() {
        debug!("Could not coerce {field}={value} to integer; using null");
    }
    coerced
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Strings pass through; numbers and booleans are rendered. Arrays and
/// objects have no sensible text form and become `None`.
pub fn coerce_text(field: &str, value: Option<&Value>) -> Option<String> {
    let value = value?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => {
            debug!("Could not coerce {field}={value} to text; using null");
            None
        }
    }
}

/// Unix seconds to a UTC timestamp. Out-of-range values become `None`.
pub fn coerce_epoch(field: &str, value: Option<&Value>) -> Option<DateTime<Utc>> {
    let seconds = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };
    let ts = seconds.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0));
    if ts.is_none() {
        debug!("Could not convert {field} to a UTC timestamp; using null");
    }
    ts
}
