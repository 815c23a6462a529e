use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use validator::Validate;

use crate::hardware::HardwareMode;

/// Default location of the configuration file, relative to the working dir.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub transport: TransportConfig,
    #[validate(nested)]
    pub sensor: SensorConfig,
    #[validate(nested)]
    pub ucm: UcmConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub water_heater: WaterHeaterConfig,
    #[serde(default)]
    #[validate(nested)]
    pub controller: ControllerConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransportConfig {
    #[serde(default = "default_mode")]
    pub mode: HardwareMode,
    #[validate(length(min = 1))]
    pub serial_port: String,
    #[serde(default = "default_baud_rate")]
    #[validate(range(min = 1200))]
    pub baud_rate: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SensorConfig {
    /// MCP3008 channel the current transducer is wired to.
    #[validate(range(max = 7))]
    pub mcp_channel: u8,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UcmConfig {
    /// Minutes between outside-communication "Found" announcements.
    #[validate(range(min = 1))]
    pub heartbeat_minutes: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoggingConfig {
    pub path: PathBuf,
    /// Minimum minutes between telemetry records.
    #[validate(range(min = 1))]
    pub increment_minutes: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WaterHeaterConfig {
    #[validate(range(min = 0.0))]
    pub rated_import_ramp: f64,
    #[serde(default = "default_rated_import_power")]
    #[validate(range(min = 0.0))]
    pub rated_import_power: f64,
    /// Ambient standby losses (W)
    #[serde(default = "default_idle_losses")]
    #[validate(range(min = 0.0))]
    pub idle_losses: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ControllerConfig {
    #[validate(range(min = 10))]
    pub tick_millis: u64,
    #[validate(range(min = 1))]
    pub refresh_interval_millis: u64,
    /// Assumed RMS line voltage for real power estimation
    #[validate(range(min = 1.0))]
    pub line_voltage: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_millis: 250,
            refresh_interval_millis: 500,
            line_voltage: 240.0,
        }
    }
}

impl ControllerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_millis)
    }
}

fn default_mode() -> HardwareMode {
    HardwareMode::Simulated
}

fn default_baud_rate() -> u32 {
    19_200
}

fn default_rated_import_power() -> f64 {
    4_500.0
}

fn default_idle_losses() -> f64 {
    100.0
}

impl Config {
    /// Load `config/default.toml` overridden by `EWH__SECTION__KEY` variables.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(DEFAULT_CONFIG_PATH))
            .merge(Env::prefixed("EWH__").split("__"));
        Self::from_figment(figment)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("invalid configuration")?;
        cfg.validate().context("configuration failed validation")?;
        Ok(cfg)
    }
}
