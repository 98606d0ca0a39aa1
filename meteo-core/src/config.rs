use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{client::Endpoints, retry::RetryPolicy};

pub const DEFAULT_FORECAST_HOST: &str = "api.open-meteo.com";
pub const DEFAULT_AIR_QUALITY_HOST: &str = "air-quality-api.open-meteo.com";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// latitude = 49.25
/// longitude = -123.12
/// timezone = "America/Vancouver"
/// retry_attempts = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,

    /// Passed to the forecast API; "auto" resolves from the coordinates.
    /// Date fields are read back in the process's local zone, so the two should agree.
    pub timezone: String,

    pub forecast_host: String,
    pub air_quality_host: String,

    /// Total attempts per endpoint, including the first.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub http_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            timezone: "auto".to_string(),
            forecast_host: DEFAULT_FORECAST_HOST.to_string(),
            air_quality_host: DEFAULT_AIR_QUALITY_HOST.to_string(),
            retry_attempts: 3,
            retry_delay_ms: 3_000,
            http_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(anyhow!("Latitude {} is out of range (-90..=90)", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(anyhow!("Longitude {} is out of range (-180..=180)", self.longitude));
        }
        if self.timezone.trim().is_empty() {
            return Err(anyhow!("Timezone must not be empty; use \"auto\" to infer it"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(
            &self.forecast_host,
            &self.air_quality_host,
            self.latitude,
            self.longitude,
            &self.timezone,
        )
        .with_context(|| {
            format!(
                "Invalid endpoint hosts: '{}', '{}'",
                self.forecast_host, self.air_quality_host
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EndpointKind;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = Config::from_toml("latitude = 49.25\nlongitude = -123.12\n").unwrap();

        assert_eq!(cfg.latitude, 49.25);
        assert_eq!(cfg.timezone, "auto");
        assert_eq!(cfg.forecast_host, DEFAULT_FORECAST_HOST);
        assert_eq!(cfg.retry_policy(), RetryPolicy::new(3, Duration::from_secs(3)));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = Config::from_toml("latitude = 91.0").unwrap_err();
        assert!(err.to_string().contains("Latitude"));

        let err = Config::from_toml("longitude = -200.0").unwrap_err();
        assert!(err.to_string().contains("Longitude"));
    }

    #[test]
    fn roundtrips_through_toml() {
        let cfg = Config {
            latitude: 52.52,
            longitude: 13.41,
            timezone: "Europe/Berlin".into(),
            retry_attempts: 5,
            ..Config::default()
        };

        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn endpoints_use_configured_hosts() {
        let cfg = Config { forecast_host: "meteo.internal".into(), ..Config::default() };
        let endpoints = cfg.endpoints().unwrap();

        assert_eq!(endpoints.url(EndpointKind::Forecast).host_str(), Some("meteo.internal"));
        assert_eq!(
            endpoints.url(EndpointKind::AirQuality).host_str(),
            Some(DEFAULT_AIR_QUALITY_HOST)
        );
    }

    #[test]
    fn bad_host_is_an_error() {
        let cfg = Config { forecast_host: "bad host/with space".into(), ..Config::default() };
        assert!(cfg.endpoints().is_err());
    }
}
