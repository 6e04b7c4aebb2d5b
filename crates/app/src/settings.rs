//! Handles settings for the application. Configuration is written in
//! `settings.toml`, every key can be overridden with a `LEDGER_` prefixed
//! environment variable (`LEDGER_SERVER__PORT=8080`).
//!
//! See `settings.toml` at the repository root for an example.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Lifetime of pending change requests.
#[derive(Debug, Deserialize)]
pub struct Requests {
    pub ttl_hours: i64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Requests {
    /// The request TTL, which must be a positive number of hours that
    /// `chrono` can represent.
    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_hours(self.ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "requests.ttl_hours out of range: {}",
                    self.ttl_hours
                ))
            })
    }
}

fn default_sweep_interval() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub requests: Option<Requests>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings"))
                .add_source(Environment::with_prefix("LEDGER").separator("__"))
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}
