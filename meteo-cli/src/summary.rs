//! Plain-text and JSON views of a fetch.

use std::fmt;

use meteo_core::{FetchOutcome, ForecastResult, Payload, Timestamp};
use serde_json::{Value, json};

const HOURS_SHOWN: usize = 12;

pub fn render(forecast: &FetchOutcome, air_quality: &FetchOutcome) -> String {
    Report { forecast, air_quality }.to_string()
}

/// Both outcomes, formatted for a terminal.
struct Report<'a> {
    forecast: &'a FetchOutcome,
    air_quality: &'a FetchOutcome,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.forecast {
            FetchOutcome::Done(Payload::Forecast(r)) => write_forecast(f, r)?,
            FetchOutcome::Done(other) => {
                writeln!(f, "Forecast: unexpected {} payload", other.kind())?;
            }
            FetchOutcome::Failed(failure) => {
                writeln!(f, "Forecast unavailable: {}", failure.message)?;
            }
        }

        match self.air_quality {
            FetchOutcome::Done(Payload::AirQuality(r)) => {
                writeln!(f, "Air quality (US AQI): {}", r.aqi)
            }
            FetchOutcome::Done(other) => {
                writeln!(f, "Air quality: unexpected {} payload", other.kind())
            }
            FetchOutcome::Failed(failure) => {
                writeln!(f, "Air quality unavailable: {}", failure.message)
            }
        }
    }
}

fn write_forecast(f: &mut fmt::Formatter<'_>, r: &ForecastResult) -> fmt::Result {
    let c = &r.current;
    writeln!(f, "Location: {:.3}, {:.3} ({})", r.latitude, r.longitude, r.timezone)?;
    writeln!(
        f,
        "Now: {:.1}° (feels {:.1}°), humidity {}%, {} hPa, wind {:.1} from {}°, gusts {:.1}",
        c.temperature,
        c.feels_like,
        c.humidity,
        c.pressure,
        c.wind_speed,
        c.wind_direction,
        c.wind_gust
    )?;
    writeln!(
        f,
        "UV {:.1}, visibility {} m, code {}, sunrise {}, sunset {}",
        c.uv_index,
        c.visibility,
        c.weather_code,
        clock(c.sunrise),
        clock(c.sunset)
    )?;

    if !r.hourly.is_empty() {
        writeln!(f, "\nHourly:")?;
        for h in r.hourly.iter().take(HOURS_SHOWN) {
            writeln!(
                f,
                "  {}  {:>5.1}°  {:>3.0}% {:>4.1} mm  code {}",
                clock(h.time),
                h.temperature,
                h.precipitation_probability,
                h.precipitation,
                h.weather_code
            )?;
        }
    }

    if !r.daily.is_empty() {
        writeln!(f, "\nDaily:")?;
        for d in &r.daily {
            writeln!(
                f,
                "  {}  {:>5.1}° / {:>5.1}°  {:>3.0}% {:>4.1} mm  UV {:.1}  code {}",
                day(d.time),
                d.temperature_min,
                d.temperature_max,
                d.precipitation_probability,
                d.precipitation_sum,
                d.uv_index_max,
                d.weather_code
            )?;
        }
    }

    Ok(())
}

pub fn to_json(forecast: &FetchOutcome, air_quality: &FetchOutcome) -> Value {
    json!({
        "forecast": outcome_json(forecast),
        "air_quality": outcome_json(air_quality),
    })
}

fn outcome_json(outcome: &FetchOutcome) -> Value {
    match outcome {
        FetchOutcome::Done(payload) => json!({ "ok": payload }),
        FetchOutcome::Failed(f) => json!({
            "error": {
                "kind": f.kind.as_str(),
                "message": f.message,
                "attempts": f.attempts,
                "rssi_dbm": f.rssi_dbm,
            }
        }),
    }
}

fn clock(ts: Timestamp) -> String {
    ts.to_local().map_or_else(|| "--:--".to_string(), |dt| dt.format("%a %H:%M").to_string())
}

fn day(ts: Timestamp) -> String {
    ts.to_local().map_or_else(|| "---".to_string(), |dt| dt.format("%a %d %b").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meteo_core::{AirQualityResult, DailyEntry, FailureKind, FetchFailure, HourlyEntry};

    fn failed(message: &str) -> FetchOutcome {
        FetchOutcome::Failed(FetchFailure {
            kind: FailureKind::Transport,
            status: None,
            attempts: 3,
            rssi_dbm: Some(-80),
            message: message.to_string(),
        })
    }

    #[test]
    fn failures_are_shown_verbatim() {
        let text = render(&failed("Connection Lost RSSI:-80dBm (after 3 attempts)"), &failed("x"));

        assert!(text.contains("Forecast unavailable: Connection Lost RSSI:-80dBm (after 3 attempts)"));
        assert!(text.contains("Air quality unavailable: x"));
    }

    #[test]
    fn success_renders_aqi_and_current() {
        let forecast = FetchOutcome::Done(Payload::Forecast(ForecastResult {
            timezone: "UTC".into(),
            ..ForecastResult::default()
        }));
        let aq = FetchOutcome::Done(Payload::AirQuality(AirQualityResult { aqi: 42 }));

        let text = render(&forecast, &aq);

        assert!(text.contains("Air quality (US AQI): 42"));
        assert!(text.contains("sunrise --:--"));
        assert!(!text.contains("Hourly:"));
    }

    #[test]
    fn hourly_and_daily_sections_are_listed() {
        let forecast = FetchOutcome::Done(Payload::Forecast(ForecastResult {
            hourly: vec![HourlyEntry { temperature: 4.5, ..HourlyEntry::default() }; 20],
            daily: vec![DailyEntry { uv_index_max: 2.5, ..DailyEntry::default() }; 2],
            ..ForecastResult::default()
        }));

        let text = render(&forecast, &failed("x"));

        assert!(text.contains("\nHourly:\n"));
        assert_eq!(text.matches("  4.5°").count(), HOURS_SHOWN);
        assert_eq!(text.matches("UV 2.5").count(), 2);
        assert!(text.ends_with("Air quality unavailable: x\n"));
    }

    #[test]
    fn json_view_reports_errors() {
        let aq = FetchOutcome::Done(Payload::AirQuality(AirQualityResult { aqi: 7 }));
        let v = to_json(&failed("boom"), &aq);

        assert_eq!(v["forecast"]["error"]["kind"], "transport");
        assert_eq!(v["forecast"]["error"]["attempts"], 3);
        assert_eq!(v["air_quality"]["ok"]["aqi"], 7);
    }
}
