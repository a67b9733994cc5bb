//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use crate::models::{AutoPriority, SelectionMode};
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
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

    /// Allowed CORS origins, comma separated
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Quoting and selection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Price services without an active card from a default base price,
    /// flagged `estimated`
    #[serde(default)]
    pub allow_estimated_fallback: bool,

    /// Default base price used by the estimated fallback
    #[serde(default)]
    pub legacy_default_base_price: Option<Decimal>,

    /// Mode for sellers without an active policy
    #[serde(default)]
    pub default_selection_mode: SelectionMode,

    /// Priority for sellers without an active policy
    #[serde(default)]
    pub default_auto_priority: AutoPriority,

    /// Balanced tolerance for sellers without an active policy
    #[serde(default = "default_balanced_delta")]
    pub default_balanced_delta_percent: Decimal,
}

fn default_balanced_delta() -> Decimal {
    Decimal::from(10)
}

impl PricingConfig {
    /// Default base price if the estimated fallback is enabled and configured
    pub fn estimated_base_price(&self) -> Option<Decimal> {
        if self.allow_estimated_fallback {
            self.legacy_default_base_price
        } else {
            None
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            allow_estimated_fallback: false,
            legacy_default_base_price: None,
            default_selection_mode: SelectionMode::ManualWithRecommendation,
            default_auto_priority: AutoPriority::Price,
            default_balanced_delta_percent: default_balanced_delta(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 9001)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("pricing.allow_estimated_fallback", false)?
            .set_default("pricing.default_selection_mode", "manual_with_recommendation")?
            .set_default("pricing.default_auto_priority", "price")?
            .set_default("pricing.default_balanced_delta_percent", "10")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with SHIPWISE_ prefix
            .add_source(
                Environment::with_prefix("SHIPWISE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("SHIPWISE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
