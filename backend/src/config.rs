//! Configuration management for the QR Warehouse Scan Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with QRW_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// QR raster rendering
    pub qr: QrConfig,

    /// Dashboard listing limits
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QrConfig {
    /// Pixels per QR module
    pub module_size: u32,

    /// Whether to draw the four-module quiet zone
    pub quiet_zone: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Upper bound for search suggestion lists
    pub suggestion_limit: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("QRW_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.secret", "development-secret-key")?
            .set_default("jwt.access_token_expiry", 86400)?
            .set_default("qr.module_size", 8)?
            .set_default("qr.quiet_zone", true)?
            .set_default("dashboard.default_page_size", 50)?
            .set_default("dashboard.max_page_size", 200)?
            .set_default("dashboard.suggestion_limit", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (QRW_ prefix)
            .add_source(
                Environment::with_prefix("QRW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            module_size: 8,
            quiet_zone: true,
        }
    }
}
