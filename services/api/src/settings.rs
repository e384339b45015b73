//! Service settings
//!
//! Sources are layered, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. the file named by `APP_CONFIG` (optional)
//! 4. `DATABASE_URL`, for the database URL only
//! 5. `APP__<SECTION>__<KEY>` environment variables, e.g. `APP__JWT__SECRET`

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{jwt::JwtConfig, rate_limiter::RateLimiterConfig};

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix every user route is nested under
    pub api_prefix: String,
    pub request_timeout_secs: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_prefix: "/v1".to_string(),
            request_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimiterConfig,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("APP_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let mut settings: Settings = builder
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if std::env::var_os("APP__DATABASE__URL").is_none() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                settings.database.url = url;
            }
        }

        settings
            .database
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }
}
