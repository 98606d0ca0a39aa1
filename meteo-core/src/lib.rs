//! Core library for the `meteo` forecast client.
//!
//! This crate defines:
//! - Typed forecast and air-quality models
//! - Timestamp normalization and lenient JSON deserialization
//! - A fetch-and-retry client over a pluggable HTTP transport
//! - Configuration handling
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod fields;
pub mod model;
pub mod response;
pub mod retry;
pub mod signal;
pub mod timestamp;
pub mod transport;

pub use client::{Endpoints, FetchFailure, FetchOutcome, ForecastClient, Status};
pub use config::Config;
pub use model::{
    AirQualityResult, CurrentConditions, DailyEntry, EndpointKind, ForecastResult, HourlyEntry,
    Payload, Timestamp,
};
pub use response::{ParseError, deserialize_air_quality, deserialize_forecast};
pub use retry::{FailureKind, RetryPolicy};
pub use signal::{FixedSignal, ProcWireless, SignalProbe};
pub use timestamp::normalize;
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
