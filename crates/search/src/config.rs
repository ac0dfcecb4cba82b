//! Search service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required for database commands
//! - `SEARCH_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `SEARCH_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `SEARCH_DEFAULT_SHOP_ID` - Shop used when a command does not name one
//! - `SEARCH_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use secrecy::SecretString;
use thiserror::Error;

use shop_search_core::ShopId;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("expected 'text' or 'json', got '{s}'")),
        }
    }
}

/// Search service configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    pub max_connections: u32,
    pub default_shop_id: Option<ShopId>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl SearchConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = env("SEARCH_DATABASE_URL")
            .or_else(|| env("DATABASE_URL"))
            .map(SecretString::from);

        let max_connections = match non_empty(&env, "SEARCH_MAX_CONNECTIONS") {
            Some(value) => parse_max_connections(&value)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = match non_empty(&env, "SEARCH_LOG_FORMAT") {
            Some(value) => value.parse::<LogFormat>().map_err(|e| {
                ConfigError::InvalidEnvVar("SEARCH_LOG_FORMAT".to_string(), e)
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            max_connections,
            default_shop_id: non_empty(&env, "SEARCH_DEFAULT_SHOP_ID").map(ShopId::new),
            log_format,
            sentry_dsn: non_empty(&env, "SENTRY_DSN"),
            sentry_environment: non_empty(&env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// The database URL, required by commands that touch `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither `SEARCH_DATABASE_URL`
    /// nor `DATABASE_URL` is set.
    pub fn database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SEARCH_DATABASE_URL".to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating an empty value as unset.
fn non_empty(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

fn parse_max_connections(value: &str) -> Result<u32, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar("SEARCH_MAX_CONNECTIONS".to_string(), reason);

    let n = value.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if n == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(n)
}
