//! CLI command implementations.

pub mod migrate;
pub mod reindex;
pub mod search;
pub mod validate;

use sqlx::PgPool;
use thiserror::Error;

use shop_search::{ConfigError, SearchConfig, SearchError};
use shop_search_core::{SearchCollection, ValidationError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// No `--shop` given and no default configured.
    #[error("No shop given. Pass --shop or set SEARCH_DEFAULT_SHOP_ID")]
    MissingShop,

    /// The caller lacks the permission the collection requires.
    #[error("Search of {0} denied for this caller")]
    Denied(SearchCollection),

    #[error("Invalid: {}", join_reasons(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_reasons(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.reason.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Connect to the configured database.
async fn connect(config: &SearchConfig) -> Result<PgPool, CommandError> {
    let database_url = config.database_url()?;

    tracing::info!("Connecting to database...");
    let pool = shop_search::db::create_pool(database_url, config.max_connections).await?;
    Ok(pool)
}
