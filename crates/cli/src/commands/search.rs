//! Ad-hoc search command.
//!
//! Prints one JSON object per matching record, in insertion order.
//!
//! # Usage
//!
//! ```bash
//! shop-search search products "canvas" --shop shop-1
//! shop-search search accounts "@example.com" --shop shop-1 -p read_accounts
//! ```

use std::io::Write;
use std::sync::Arc;

use shop_search::{PgStore, QueryGateway, SearchConfig, SearchOutcome};
use shop_search_core::{Caller, Permission, SearchCollection, ShopId};

use super::{CommandError, connect};

/// Arguments of a search invocation.
#[derive(Debug)]
pub struct SearchRequest {
    pub collection: SearchCollection,
    pub term: String,
    pub shop: Option<String>,
    pub permissions: Vec<Permission>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    /// Build the caller, falling back to the configured default shop.
    fn caller(&self, config: &SearchConfig) -> Result<Caller, CommandError> {
        let shop_id = self
            .shop
            .as_deref()
            .map(ShopId::from)
            .or_else(|| config.default_shop_id.clone())
            .ok_or(CommandError::MissingShop)?;

        Ok(Caller::with_permissions(
            shop_id,
            self.permissions.iter().copied(),
        ))
    }
}

/// Run a search and print the results.
///
/// # Errors
///
/// Returns `CommandError::Denied` if the caller may not search the
/// collection, or another `CommandError` on database or output failure.
pub async fn run(config: &SearchConfig, request: SearchRequest) -> Result<(), CommandError> {
    let caller = request.caller(config)?;
    let gateway = QueryGateway::new(Arc::new(PgStore::new(connect(config).await?)));

    let cursor = match gateway.search(request.collection, &request.term, &caller)? {
        SearchOutcome::Denied => return Err(CommandError::Denied(request.collection)),
        SearchOutcome::Granted(cursor) => cursor,
    };

    let total = cursor.count().await?;
    let records = match request.limit {
        Some(limit) => cursor.fetch_limited(limit).await?,
        None => cursor.fetch().await?,
    };

    let mut stdout = std::io::stdout().lock();
    for record in &records {
        serde_json::to_writer(&mut stdout, record)?;
        writeln!(stdout).map_err(serde_json::Error::io)?;
    }

    tracing::info!(total, shown = records.len(), "Search complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shop_search::LogFormat;

    use super::*;

    fn config(default_shop: Option<&str>) -> SearchConfig {
        SearchConfig {
            database_url: None,
            max_connections: 5,
            default_shop_id: default_shop.map(ShopId::new),
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn request(shop: Option<&str>) -> SearchRequest {
        SearchRequest {
            collection: SearchCollection::Orders,
            term: String::new(),
            shop: shop.map(str::to_string),
            permissions: vec![Permission::ReadOrders],
            limit: None,
        }
    }

    #[test]
    fn test_caller_prefers_explicit_shop() {
        let caller = request(Some("shop-2")).caller(&config(Some("shop-1"))).unwrap();
        assert_eq!(caller, Caller::with_permissions(ShopId::new("shop-2"), [Permission::ReadOrders]));
    }

    #[test]
    fn test_caller_falls_back_to_default_shop() {
        let caller = request(None).caller(&config(Some("shop-1"))).unwrap();
        assert_eq!(caller, Caller::with_permissions(ShopId::new("shop-1"), [Permission::ReadOrders]));
    }

    #[test]
    fn test_caller_requires_a_shop() {
        assert!(matches!(
            request(None).caller(&config(None)),
            Err(CommandError::MissingShop)
        ));
    }
}
