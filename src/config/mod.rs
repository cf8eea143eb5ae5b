//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `FOCUS_RELAY` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use focus_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod providers;
mod search;
mod server;
mod streaming;

pub use error::{ConfigError, ValidationError};
pub use providers::{ModelProvider, ProvidersConfig};
pub use search::SearchConfig;
pub use server::{Environment, ServerConfig};
pub use streaming::StreamingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only provider credentials and the SearxNG URL
/// must be supplied. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-request timeouts and connection buffering
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Chat and embedding model providers
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// SearxNG backend and source selection
    #[serde(default)]
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FOCUS_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FOCUS_RELAY__SERVER__PORT=3001` -> `server.port = 3001`
    /// - `FOCUS_RELAY__PROVIDERS__OPENAI_API_KEY=...` -> `providers.openai_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FOCUS_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.streaming.validate()?;
        self.providers.validate()?;
        self.search.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
