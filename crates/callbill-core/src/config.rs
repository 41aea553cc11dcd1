//! Application configuration
//!
//! Centralized configuration management using the `config` crate.
//! Values come from built-in defaults, optional config files, and
//! `CALLBILL__*` environment variables, in that order of precedence.

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tariff: TariffConfig,
    pub log: LogConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply embedded migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

/// Tariff configuration
///
/// Clock times are `HH:MM`. The Reduced band is the complement of the
/// Standard band, so only the Standard window is configured.
#[derive(Debug, Deserialize, Clone)]
pub struct TariffConfig {
    /// First clock minute of the Standard band
    #[serde(default = "default_standard_start")]
    pub standard_start: String,

    /// Last clock minute of the Standard band
    #[serde(default = "default_standard_end")]
    pub standard_end: String,

    /// Flat fee for calls starting in the Standard band
    #[serde(default = "default_standing_charge")]
    pub standard_standing_charge: Decimal,

    /// Per-minute charge inside the Standard band
    #[serde(default = "default_standard_minute_charge")]
    pub standard_minute_charge: Decimal,

    /// Flat fee for calls starting in the Reduced band
    #[serde(default = "default_standing_charge")]
    pub reduced_standing_charge: Decimal,

    /// Per-minute charge inside the Reduced band
    #[serde(default)]
    pub reduced_minute_charge: Decimal,
}

fn default_standard_start() -> String {
    "06:00".to_string()
}

fn default_standard_end() -> String {
    "21:59".to_string()
}

fn default_standing_charge() -> Decimal {
    Decimal::new(36, 2)
}

fn default_standard_minute_charge() -> Decimal {
    Decimal::new(9, 2)
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Default level for the callbill crates
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from environment and optional config files
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("CALLBILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.run_migrations", true)?
            .set_default("tariff.standard_start", "06:00")?
            .set_default("tariff.standard_end", "21:59")?
            .set_default("tariff.standard_standing_charge", "0.36")?
            .set_default("tariff.standard_minute_charge", "0.09")?
            .set_default("tariff.reduced_standing_charge", "0.36")?
            .set_default("tariff.reduced_minute_charge", "0.00")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            standard_start: default_standard_start(),
            standard_end: default_standard_end(),
            standard_standing_charge: default_standing_charge(),
            standard_minute_charge: default_standard_minute_charge(),
            reduced_standing_charge: default_standing_charge(),
            reduced_minute_charge: Decimal::ZERO,
        }
    }
}
