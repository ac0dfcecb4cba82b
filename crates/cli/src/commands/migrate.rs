//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shop-search migrate
//! ```
//!
//! Applies the migrations in `crates/search/migrations/`, creating the `shop`
//! schema (source entities) and the `search` schema (search collections).

use shop_search::SearchConfig;

use super::{CommandError, connect};

/// Run pending database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run(config: &SearchConfig) -> Result<(), CommandError> {
    let pool = connect(config).await?;

    tracing::info!("Running migrations...");
    shop_search::db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
