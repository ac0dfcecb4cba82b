//! `PostgreSQL` storage for shop search.
//!
//! # Schemas
//!
//! - `shop` - source entities (`products`, `accounts`, `orders`); nested
//!   lists are stored as JSONB
//! - `search` - derived search collections (`product_search`,
//!   `account_search`, `order_search`); flattened lists are `TEXT[]`
//!
//! Search records carry a `seq` column assigned on first insert, so results
//! come back in insertion order regardless of later upserts.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/search/migrations/` and run via:
//! ```bash
//! cargo run -p shop-search-cli -- migrate
//! ```

mod entities;
mod search;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Entity and search store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Convert an optional result limit into a `LIMIT` bind value.
///
/// `LIMIT NULL` means no limit in `PostgreSQL`.
fn limit_param(limit: Option<usize>) -> Option<i64> {
    limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}
