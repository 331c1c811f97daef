//! Configuration management for the irrigation advisory service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with IRR_ prefix

use std::time::Duration;

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

    /// Geocoding service configuration
    pub geocoding: GeocodingConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Advisory text-generation configuration
    pub advisory: AdvisoryConfig,

    /// Per-stage budgets and retry policy
    pub pipeline: PipelineConfig,
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
    /// PostgreSQL connection URL; records stay in memory when unset
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Nominatim-compatible base URL
    pub base_url: String,

    /// Sent on every request; Nominatim rejects anonymous clients
    pub user_agent: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Cache entry lifetime in seconds
    pub cache_ttl_secs: u64,
}

/// Which weather upstream to talk to
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProviderKind {
    WeatherApi,
    OpenWeatherMap,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Upstream flavour
    pub provider: WeatherProviderKind,

    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Cache entry lifetime in seconds
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdvisoryConfig {
    /// Text-generation endpoint (generateContent URL)
    pub api_endpoint: String,

    /// Text-generation API key
    pub api_key: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    pub geocode_budget_ms: u64,
    pub weather_budget_ms: u64,
    pub advisory_budget_ms: u64,
    /// Pause before the single retry of a transient failure
    pub retry_backoff_ms: u64,
    pub cache_purge_interval_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IRR_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("geocoding.base_url", "https://nominatim.openstreetmap.org")?
            .set_default("geocoding.user_agent", "IrrigationAdvisory/0.1 (ops@example.com)")?
            .set_default("geocoding.timeout_ms", 5000)?
            .set_default("geocoding.cache_ttl_secs", 600)?
            .set_default("weather.provider", "weatherapi")?
            .set_default("weather.api_endpoint", "https://api.weatherapi.com/v1")?
            .set_default("weather.api_key", "")?
            .set_default("weather.timeout_ms", 5000)?
            .set_default("weather.cache_ttl_secs", 600)?
            .set_default(
                "advisory.api_endpoint",
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
            )?
            .set_default("advisory.api_key", "")?
            .set_default("advisory.timeout_ms", 15000)?
            .set_default("pipeline.geocode_budget_ms", 8000)?
            .set_default("pipeline.weather_budget_ms", 8000)?
            .set_default("pipeline.advisory_budget_ms", 20000)?
            .set_default("pipeline.retry_backoff_ms", 500)?
            .set_default("pipeline.cache_purge_interval_secs", 60)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IRR_ prefix)
            .add_source(
                Environment::with_prefix("IRR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl AdvisoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl PipelineConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn cache_purge_interval(&self) -> Duration {
        Duration::from_secs(self.cache_purge_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geocode_budget_ms: 8000,
            weather_budget_ms: 8000,
            advisory_budget_ms: 20000,
            retry_backoff_ms: 500,
            cache_purge_interval_secs: 60,
        }
    }
}
