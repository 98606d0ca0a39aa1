//! Raw JSON bodies to bounded, typed records.
//!
//! Only a syntactically broken (or oversized) document is an error. Missing
//! fields, mistyped values and short arrays fall back to per-field defaults,
//! since the upstream API drops fields outside the requested parameter set.

use chrono::{Local, TimeZone};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    fields::Section,
    model::{
        AirQualityResult, CurrentConditions, DailyEntry, ForecastResult, HourlyEntry, MAX_DAILY,
        MAX_HOURLY,
    },
    timestamp::normalize_in,
};

/// Largest body handed to the JSON parser.
pub const MAX_DOCUMENT_BYTES: usize = 256 * 1024;

const DEFAULT_VISIBILITY: i32 = 10_000;
const DEFAULT_IS_DAY: i32 = 1;

/// The payload could not be parsed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub fn deserialize_forecast(raw: &str) -> Result<ForecastResult, ParseError> {
    deserialize_forecast_in(raw, &Local)
}

pub fn deserialize_air_quality(raw: &str) -> Result<AirQualityResult, ParseError> {
    let doc = parse_document(raw)?;
    let aqi = Section::root(&doc).section("current").read("us_aqi", 0);

    debug!(aqi, "air quality deserialized");
    Ok(AirQualityResult { aqi })
}

/// Like [`deserialize_forecast`], with date fields read as wall-clock times in `tz`.
pub fn deserialize_forecast_in<Tz: TimeZone>(
    raw: &str,
    tz: &Tz,
) -> Result<ForecastResult, ParseError> {
    let doc = parse_document(raw)?;
    let root = Section::root(&doc);

    let daily = read_daily(root.section("daily"), tz);
    let mut current = read_current(root.section("current"));
    if let Some(today) = daily.first() {
        current.sunrise = today.sunrise;
        current.sunset = today.sunset;
    }
    let hourly = read_hourly(root.section("hourly"), tz);

    debug!(
        hourly = hourly.len(),
        daily = daily.len(),
        temperature = current.temperature,
        "forecast deserialized"
    );

    Ok(ForecastResult {
        latitude: root.read("latitude", 0.0),
        longitude: root.read("longitude", 0.0),
        timezone: root.read("timezone", "UTC".to_string()),
        utc_offset_seconds: root.read("utc_offset_seconds", 0),
        current,
        hourly,
        daily,
    })
}

fn parse_document(raw: &str) -> Result<Value, ParseError> {
    if raw.len() > MAX_DOCUMENT_BYTES {
        return Err(ParseError::new(format!(
            "document of {} bytes exceeds capacity of {MAX_DOCUMENT_BYTES} bytes",
            raw.len()
        )));
    }

    serde_json::from_str(raw).map_err(|e| {
        debug!(error = %e, "response deserialization failed");
        ParseError::new(e.to_string())
    })
}

fn read_current(current: Section<'_>) -> CurrentConditions {
    CurrentConditions {
        temperature: current.read("temperature_2m", 0.0),
        feels_like: current.read("apparent_temperature", 0.0),
        humidity: current.read("relative_humidity_2m", 0),
        pressure: current.read("pressure_msl", 0),
        wind_speed: current.read("wind_speed_10m", 0.0),
        wind_direction: current.read("wind_direction_10m", 0),
        wind_gust: current.read("wind_gusts_10m", 0.0),
        uv_index: current.read("uv_index", 0.0),
        visibility: current.read("visibility", DEFAULT_VISIBILITY),
        weather_code: current.read("weather_code", 0),
        is_day: current.read("is_day", DEFAULT_IS_DAY),
        ..CurrentConditions::default()
    }
}

fn read_hourly<Tz: TimeZone>(hourly: Section<'_>, tz: &Tz) -> Vec<HourlyEntry> {
    let time = hourly.series("time");
    let temperature = hourly.series("temperature_2m");
    let humidity = hourly.series("relative_humidity_2m");
    let pop = hourly.series("precipitation_probability");
    let precipitation = hourly.series("precipitation");
    let code = hourly.series("weather_code");
    let is_day = hourly.series("is_day");

    (0..time.len().min(MAX_HOURLY))
        .map(|i| HourlyEntry {
            time: normalize_in(time.str_at(i), tz),
            temperature: temperature.at(i, 0.0),
            humidity: humidity.at(i, 0),
            precipitation_probability: pop.at(i, 0.0),
            precipitation: precipitation.at(i, 0.0),
            weather_code: code.at(i, 0),
            is_day: is_day.at(i, DEFAULT_IS_DAY),
        })
        .collect()
}

fn read_daily<Tz: TimeZone>(daily: Section<'_>, tz: &Tz) -> Vec<DailyEntry> {
    let time = daily.series("time");
    let temperature_max = daily.series("temperature_2m_max");
    let temperature_min = daily.series("temperature_2m_min");
    let sunrise = daily.series("sunrise");
    let sunset = daily.series("sunset");
    let pop = daily.series("precipitation_probability_max");
    let precipitation = daily.series("precipitation_sum");
    let code = daily.series("weather_code");
    let uv = daily.series("uv_index_max");

    (0..time.len().min(MAX_DAILY))
        .map(|i| DailyEntry {
            time: normalize_in(time.str_at(i), tz),
            temperature_min: temperature_min.at(i, 0.0),
            temperature_max: temperature_max.at(i, 0.0),
            sunrise: normalize_in(sunrise.str_at(i), tz),
            sunset: normalize_in(sunset.str_at(i), tz),
            precipitation_probability: pop.at(i, 0.0),
            precipitation_sum: precipitation.at(i, 0.0),
            weather_code: code.at(i, 0),
            uv_index_max: uv.at(i, 0.0),
        })
        .collect()
}
