//! Blastoff service runner.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use blastoff_app::{drivers::LoggingDriver, Controller, DriverError, StripConfig};
use blastoff_network::{Server, StateBroadcaster, DEFAULT_SOCKET_PATH};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{signal, SignalKind};

/// Animation service configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Control socket path.
    pub socket: PathBuf,
    /// LED strip parameters.
    pub strip: StripConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket: PathBuf::from(DEFAULT_SOCKET_PATH),
            strip: StripConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Reads configuration from the TOML file, missing values are taken from defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Malformed config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.strip.is_empty(),
            "The LED strip must have at least one LED"
        );
        Ok(())
    }
}

/// Creates the simulated strip used when no hardware backend is wired in.
fn simulated_strip(config: &StripConfig) -> Result<LoggingDriver, DriverError> {
    Ok(LoggingDriver::new(config))
}

/// Resolves once the process receives SIGINT or SIGTERM.
pub fn termination_signal() -> anyhow::Result<impl Future<Output = ()>> {
    let mut interrupt =
        signal(SignalKind::interrupt()).context("Unable to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("Unable to install SIGTERM handler")?;

    Ok(async move {
        let signal = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        log::debug!("Signal received: {signal}");
    })
}

/// Runs the animation service until a termination signal arrives.
///
/// The animation is always stopped before returning, so the strip is left blank.
pub async fn run_daemon(config: DaemonConfig) -> anyhow::Result<()> {
    config.validate()?;

    let events = StateBroadcaster::new();
    let controller =
        Arc::new(Controller::new(simulated_strip, config.strip).with_observer(events.clone()));

    let shutdown = termination_signal()?;
    let server = Server::bind(&config.socket, controller.clone(), events)
        .await
        .with_context(|| format!("Cannot bind control socket {}", config.socket.display()))?;

    log::info!("Started");
    let served = server.serve(shutdown).await;
    log::info!("Exiting");

    tokio::task::spawn_blocking(move || controller.shutdown())
        .await?
        .context("Unable to blank the LED strip")?;
    served.context("Control socket failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DaemonConfig::from_toml("").unwrap();
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.socket, PathBuf::from("/run/blastoff.sock"));
        assert_eq!(config.strip, StripConfig::new(60, 60));
    }

    #[test]
    fn test_config_from_toml() {
        let config = DaemonConfig::from_toml(
            r#"
            socket = "/tmp/blastoff.sock"

            [strip]
            brightness = 255
            led_count = 144
            "#,
        )
        .unwrap();

        assert_eq!(config.socket, PathBuf::from("/tmp/blastoff.sock"));
        assert_eq!(config.strip.brightness, 255);
        assert_eq!(config.strip.led_count, 144);
        assert_eq!(config.strip.step_interval_ms, 50);
    }

    #[test]
    fn test_config_rejects_empty_strip() {
        let err = DaemonConfig::from_toml("[strip]\nled_count = 0\n").unwrap_err();
        assert!(err.to_string().contains("at least one LED"));
        assert!(DaemonConfig::from_toml("unknown = 1").is_err());
    }
}
