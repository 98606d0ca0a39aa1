use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use meteo_core::{
    Config, EndpointKind, FetchOutcome, ForecastClient, ProcWireless, ReqwestTransport,
};
use tracing::warn;

use crate::summary;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Forecast and air-quality client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set location, timezone and retry behaviour.
    Configure,

    /// Fetch the forecast and air quality for the configured location.
    Show {
        /// Print the deserialized model as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Override the configured number of attempts per endpoint.
        #[arg(long)]
        attempts: Option<u32>,
    },

    /// Print the path of the configuration file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { json, attempts } => show(json, attempts).await,
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    cfg.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(cfg.latitude)
        .with_error_message("Please enter a number, e.g. 49.25")
        .prompt()?;
    cfg.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(cfg.longitude)
        .with_error_message("Please enter a number, e.g. -123.12")
        .prompt()?;
    cfg.timezone = Text::new("Timezone (IANA name or \"auto\"):")
        .with_default(&cfg.timezone)
        .prompt()?;
    cfg.retry_attempts = CustomType::<u32>::new("Attempts per request:")
        .with_default(cfg.retry_attempts)
        .prompt()?;

    cfg.validate()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(json: bool, attempts: Option<u32>) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;
    if let Some(n) = attempts {
        cfg.retry_attempts = n;
    }

    let transport = ReqwestTransport::new(cfg.http_timeout())?;
    let client = ForecastClient::new(
        cfg.endpoints()?,
        cfg.retry_policy(),
        cfg.http_timeout(),
        transport,
        ProcWireless,
    );

    let forecast = client.fetch(EndpointKind::Forecast).await;
    let air_quality = client.fetch(EndpointKind::AirQuality).await;

    if let FetchOutcome::Failed(failure) = &air_quality {
        warn!(kind = %failure.kind, "air quality unavailable: {}", failure.message);
    }

    if json {
        let out = summary::to_json(&forecast, &air_quality);
        println!("{}", serde_json::to_string_pretty(&out).context("Failed to encode JSON")?);
    } else {
        print!("{}", summary::render(&forecast, &air_quality));
    }

    match forecast {
        FetchOutcome::Done(_) => Ok(()),
        FetchOutcome::Failed(failure) => Err(failure).context("Forecast unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_accepts_overrides() {
        let cli = Cli::try_parse_from(["meteo", "show", "--json", "--attempts", "5"]).unwrap();
        match cli.command {
            Command::Show { json, attempts } => {
                assert!(json);
                assert_eq!(attempts, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_path_is_kebab_case() {
        let cli = Cli::try_parse_from(["meteo", "config-path"]).unwrap();
        assert!(matches!(cli.command, Command::ConfigPath));
    }

    #[test]
    fn attempts_must_be_numeric() {
        assert!(Cli::try_parse_from(["meteo", "show", "--attempts", "many"]).is_err());
    }
}
