use chrono::{DateTime, Local, LocalResult, TimeZone};
use serde::{Deserialize, Serialize};

/// Upper bound on hourly entries kept from a forecast response.
pub const MAX_HOURLY: usize = 48;

/// Upper bound on daily entries kept from a forecast response.
pub const MAX_DAILY: usize = 8;

/// Seconds since the Unix epoch. Zero means "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn as_secs(self) -> i64 {
        self.0
    }

    pub fn is_unknown(self) -> bool {
        self == Self::ZERO
    }

    /// Render in an arbitrary zone; `None` for the zero timestamp.
    pub fn to_datetime_in<Tz: TimeZone>(self, tz: &Tz) -> Option<DateTime<Tz>> {
        if self.is_unknown() {
            return None;
        }
        match tz.timestamp_opt(self.0, 0) {
            LocalResult::Single(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn to_local(self) -> Option<DateTime<Local>> {
        self.to_datetime_in(&Local)
    }
}

/// Which upstream endpoint a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Forecast,
    AirQuality,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Forecast => "forecast",
            EndpointKind::AirQuality => "air quality",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of current conditions, in the API's native units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: i32,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub wind_gust: f64,
    pub uv_index: f64,
    pub visibility: i32,
    pub weather_code: i32,
    pub is_day: i32,
    /// Copied from the first daily entry.
    pub sunrise: Timestamp,
    pub sunset: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: Timestamp,
    pub temperature: f64,
    pub humidity: i32,
    /// Percent, 0-100.
    pub precipitation_probability: f64,
    pub precipitation: f64,
    pub weather_code: i32,
    pub is_day: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Local noon of the day.
    pub time: Timestamp,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub sunrise: Timestamp,
    pub sunset: Timestamp,
    pub precipitation_probability: f64,
    pub precipitation_sum: f64,
    pub weather_code: i32,
    pub uv_index_max: f64,
}

/// Everything one forecast request yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub utc_offset_seconds: i32,
    pub current: CurrentConditions,
    /// At most [`MAX_HOURLY`] entries, in source order.
    pub hourly: Vec<HourlyEntry>,
    /// At most [`MAX_DAILY`] entries, in source order.
    pub daily: Vec<DailyEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualityResult {
    /// US AQI; nominally 0-500 but not range checked.
    pub aqi: i32,
}

/// A successfully deserialized response for either endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Forecast(ForecastResult),
    AirQuality(AirQualityResult),
}

impl Payload {
    pub fn kind(&self) -> EndpointKind {
        match self {
            Payload::Forecast(_) => EndpointKind::Forecast,
            Payload::AirQuality(_) => EndpointKind::AirQuality,
        }
    }
}
