//! Search collection rebuild command.
//!
//! # Usage
//!
//! ```bash
//! shop-search reindex products
//! shop-search reindex all
//! ```

use std::sync::Arc;

use shop_search::{PgStore, RecordBuilder, SearchConfig};
use shop_search_core::SearchCollection;

use super::{CommandError, connect};

/// Clear and rebuild each collection from the `shop` schema.
///
/// # Errors
///
/// Returns `CommandError` on the first database failure. Collections rebuilt
/// before the failure stay rebuilt.
pub async fn run(config: &SearchConfig, collections: &[SearchCollection]) -> Result<(), CommandError> {
    let store = Arc::new(PgStore::new(connect(config).await?));
    let builder = RecordBuilder::new(Arc::clone(&store), store);

    for &collection in collections {
        tracing::info!("Rebuilding {collection}...");
        let written = builder.rebuild_collection(collection).await?;
        tracing::info!("Rebuilt {collection}: {written} records");
    }

    Ok(())
}
