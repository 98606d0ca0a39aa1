//! Fetch-and-retry client for the forecast and air-quality endpoints.

use std::time::Duration;

use anyhow::Result;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    model::{AirQualityResult, EndpointKind, ForecastResult, Payload},
    response::{self, ParseError},
    retry::{self, Effect, Event, FailureKind, RetryPolicy, State},
    signal::SignalProbe,
    transport::{Transport, TransportError},
};

const FORECAST_CURRENT: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
    pressure_msl,wind_speed_10m,wind_direction_10m,wind_gusts_10m,weather_code,uv_index,\
    visibility,is_day";
const FORECAST_HOURLY: &str =
    "temperature_2m,relative_humidity_2m,precipitation_probability,precipitation,weather_code,is_day";
const FORECAST_DAILY: &str = "temperature_2m_max,temperature_2m_min,sunrise,sunset,\
    precipitation_probability_max,precipitation_sum,weather_code,uv_index_max";

/// Request URLs, fixed for the lifetime of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    forecast: Url,
    air_quality: Url,
}

impl Endpoints {
    pub fn new(
        forecast_host: &str,
        air_quality_host: &str,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<Self> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let forecast = Url::parse_with_params(
            &format!("https://{forecast_host}/v1/forecast"),
            &[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("current", FORECAST_CURRENT),
                ("hourly", FORECAST_HOURLY),
                ("daily", FORECAST_DAILY),
                ("timezone", timezone),
                ("forecast_days", "8"),
                ("forecast_hours", "48"),
            ],
        )?;

        let air_quality = Url::parse_with_params(
            &format!("https://{air_quality_host}/v1/air-quality"),
            &[("latitude", lat.as_str()), ("longitude", lon.as_str()), ("current", "us_aqi")],
        )?;

        Ok(Self { forecast, air_quality })
    }

    pub fn url(&self, kind: EndpointKind) -> &Url {
        match kind {
            EndpointKind::Forecast => &self.forecast,
            EndpointKind::AirQuality => &self.air_quality,
        }
    }
}

/// What was observed when a request failed before deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Http(u16),
    Transport(TransportError),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Http(code) => write!(f, "HTTP {code}"),
            Status::Transport(e) => write!(f, "{e}"),
        }
    }
}

/// A terminal failure, with a message fit for direct display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    /// Set for `Transport` and `Http` failures.
    pub status: Option<Status>,
    pub attempts: u32,
    /// Signal strength sampled at failure time, for `Transport` and `Http` failures.
    pub rssi_dbm: Option<i32>,
    pub message: String,
}

impl FetchFailure {
    fn link(kind: FailureKind, status: Status, attempts: u32, rssi_dbm: Option<i32>) -> Self {
        let mut message = status.to_string();
        if let Some(rssi) = rssi_dbm {
            message.push_str(&format!(" RSSI:{rssi}dBm"));
        }
        if attempts > 1 {
            message.push_str(&format!(" (after {attempts} attempts)"));
        }

        Self { kind, status: Some(status), attempts, rssi_dbm, message }
    }

    fn parse(err: &ParseError, attempts: u32) -> Self {
        Self {
            kind: FailureKind::Parse,
            status: None,
            attempts,
            rssi_dbm: None,
            message: format!("JSON parse: {err}"),
        }
    }
}

/// Result of one `fetch` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Done(Payload),
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, FetchOutcome::Done(_))
    }

    pub fn into_result(self) -> Result<Payload, FetchFailure> {
        match self {
            FetchOutcome::Done(payload) => Ok(payload),
            FetchOutcome::Failed(failure) => Err(failure),
        }
    }
}

#[derive(Debug)]
pub struct ForecastClient<T, S> {
    endpoints: Endpoints,
    policy: RetryPolicy,
    timeout: Duration,
    transport: T,
    signal: S,
}

impl<T: Transport, S: SignalProbe> ForecastClient<T, S> {
    pub fn new(
        endpoints: Endpoints,
        policy: RetryPolicy,
        timeout: Duration,
        transport: T,
        signal: S,
    ) -> Self {
        Self { endpoints, policy, timeout, transport, signal }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetch and deserialize one endpoint, retrying transient link failures.
    pub async fn fetch(&self, kind: EndpointKind) -> FetchOutcome {
        let result = match kind {
            EndpointKind::Forecast => self.forecast().await.map(Payload::Forecast),
            EndpointKind::AirQuality => self.air_quality().await.map(Payload::AirQuality),
        };

        match result {
            Ok(payload) => FetchOutcome::Done(payload),
            Err(failure) => FetchOutcome::Failed(failure),
        }
    }

    pub async fn forecast(&self) -> Result<ForecastResult, FetchFailure> {
        self.run(EndpointKind::Forecast, response::deserialize_forecast).await
    }

    pub async fn air_quality(&self) -> Result<AirQualityResult, FetchFailure> {
        self.run(EndpointKind::AirQuality, response::deserialize_air_quality).await
    }

    async fn run<P>(
        &self,
        kind: EndpointKind,
        deserialize: fn(&str) -> Result<P, ParseError>,
    ) -> Result<P, FetchFailure> {
        let url = self.endpoints.url(kind);
        info!(endpoint = %kind, "fetching");
        debug!(%url, "request url");

        let mut state = self.policy.start();
        let mut last: Option<Status> = None;
        let mut body = String::new();
        let mut parsed: Option<P> = None;
        let mut parse_error: Option<ParseError> = None;

        loop {
            let event = match state {
                State::Attempt(n) => {
                    if n > 1 {
                        info!(endpoint = %kind, "retry attempt {}/{}", n, self.policy.max_attempts());
                    }
                    let result = self.transport.get(url, self.timeout).await;
                    let classification = retry::classify(&result);
                    match result {
                        Ok(res) if res.is_ok() => {
                            debug!(bytes = res.body.len(), "response received");
                            body = res.body;
                        }
                        Ok(res) => {
                            warn!(endpoint = %kind, attempt = n, status = res.status, "non-OK response");
                            last = Some(Status::Http(res.status));
                        }
                        Err(e) => {
                            warn!(endpoint = %kind, attempt = n, error = %e, "request failed");
                            last = Some(Status::Transport(e));
                        }
                    }
                    Event::Response(classification)
                }
                State::Deserialize(_) => match deserialize(&body) {
                    Ok(p) => {
                        parsed = Some(p);
                        Event::Parsed
                    }
                    Err(e) => {
                        parse_error = Some(e);
                        Event::ParseFailed
                    }
                },
                State::Done(attempts) => {
                    info!(endpoint = %kind, attempts, "received successfully");
                    return parsed.ok_or_else(|| {
                        FetchFailure::parse(&ParseError { message: "empty result".into() }, attempts)
                    });
                }
                State::Failed { kind: failure, attempts } => {
                    let failure = self.failure(failure, attempts, last, parse_error);
                    error!(endpoint = %kind, kind = %failure.kind, attempts, "{}", failure.message);
                    return Err(failure);
                }
            };

            let (next, effect) = self.policy.transition(state, event);
            if let Effect::Sleep(delay) = effect {
                info!(endpoint = %kind, "retryable error, waiting {} ms", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
            state = next;
        }
    }

    fn failure(
        &self,
        kind: FailureKind,
        attempts: u32,
        status: Option<Status>,
        parse_error: Option<ParseError>,
    ) -> FetchFailure {
        match (parse_error, status) {
            (Some(err), _) if kind == FailureKind::Parse => FetchFailure::parse(&err, attempts),
            (_, status) => {
                let status = status.unwrap_or_else(|| {
                    Status::Transport(TransportError::Other("no response".to_string()))
                });
                FetchFailure::link(kind, status, attempts, self.signal.rssi_dbm())
            }
        }
    }
}
