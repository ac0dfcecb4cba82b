//! Permission-gated search over the search collections.

use std::sync::Arc;

use shop_search_core::{Permission, PermissionOracle, SearchCollection, SearchRecord};

use crate::error::SearchError;
use crate::filter::{SearchFilter, SearchTerm};
use crate::store::SearchStore;

/// Result of a search request.
///
/// `Denied` means the caller may not search the collection at all, which is
/// distinct from a granted search that matches nothing.
#[derive(Debug)]
pub enum SearchOutcome<S: ?Sized> {
    Denied,
    Granted(SearchCursor<S>),
}

impl<S: ?Sized> SearchOutcome<S> {
    #[must_use]
    pub const fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }

    /// The cursor, or `None` when denied.
    #[must_use]
    pub fn into_cursor(self) -> Option<SearchCursor<S>> {
        match self {
            Self::Denied => None,
            Self::Granted(cursor) => Some(cursor),
        }
    }
}

/// A lazy, restartable view over matching records.
///
/// Creating a cursor does no I/O. Every call re-runs the match against the
/// store, so results reflect writes made after the cursor was created.
#[derive(Debug)]
pub struct SearchCursor<S: ?Sized> {
    store: Arc<S>,
    filter: SearchFilter,
}

impl<S: SearchStore + ?Sized> SearchCursor<S> {
    #[must_use]
    pub const fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    /// Number of matching records.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the store query fails.
    pub async fn count(&self) -> Result<u64, SearchError> {
        Ok(self.store.count(&self.filter).await?)
    }

    /// All matching records, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the store query fails.
    pub async fn fetch(&self) -> Result<Vec<SearchRecord>, SearchError> {
        Ok(self.store.find(&self.filter, None).await?)
    }

    /// At most `limit` matching records, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the store query fails.
    pub async fn fetch_limited(&self, limit: usize) -> Result<Vec<SearchRecord>, SearchError> {
        Ok(self.store.find(&self.filter, Some(limit)).await?)
    }
}

/// Entry point for caller-scoped searches.
pub struct QueryGateway<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for QueryGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SearchStore + ?Sized> QueryGateway<S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Search `collection` for `term` on behalf of `caller`.
    ///
    /// Results are limited to the caller's shop. Accounts require
    /// [`Permission::ReadAccounts`] and orders [`Permission::ReadOrders`];
    /// products are open to everyone, but hidden products are only included
    /// for callers holding [`Permission::CreateProduct`].
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidTerm` if the term cannot be compiled.
    pub fn search<C: PermissionOracle + ?Sized>(
        &self,
        collection: SearchCollection,
        term: &str,
        caller: &C,
    ) -> Result<SearchOutcome<S>, SearchError> {
        let shop_id = caller.shop_id();

        let required = match collection {
            SearchCollection::Products => None,
            SearchCollection::Accounts => Some(Permission::ReadAccounts),
            SearchCollection::Orders => Some(Permission::ReadOrders),
        };

        if let Some(permission) = required
            && !caller.has_permission(permission, shop_id)
        {
            tracing::info!(
                collection = %collection,
                shop_id = %shop_id,
                permission = %permission,
                "Search denied"
            );
            return Ok(SearchOutcome::Denied);
        }

        let include_hidden = collection == SearchCollection::Products
            && caller.has_permission(Permission::CreateProduct, shop_id);

        let filter = SearchFilter {
            collection,
            shop_id: shop_id.clone(),
            term: SearchTerm::new(term)?,
            include_hidden,
        };

        tracing::debug!(
            collection = %collection,
            shop_id = %shop_id,
            term = %filter.term.as_str(),
            include_hidden,
            "Search granted"
        );

        Ok(SearchOutcome::Granted(SearchCursor {
            store: Arc::clone(&self.store),
            filter,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shop_search_core::{Caller, ProductId, ProductSearchRecord, ShopId};

    use super::*;
    use crate::store::MemoryStore;

    fn hidden_product(id: &str, title: &str) -> SearchRecord {
        SearchRecord::Product(ProductSearchRecord {
            product_id: ProductId::new(id),
            shop_id: ShopId::new("shop-1"),
            title: title.to_string(),
            handle: String::new(),
            vendor: None,
            is_visible: false,
            metafields: Vec::new(),
        })
    }

    #[test]
    fn test_accounts_denied_without_permission() {
        let gateway = QueryGateway::new(Arc::new(MemoryStore::new()));
        let shopper = Caller::anonymous(ShopId::new("shop-1"));

        let outcome = gateway
            .search(SearchCollection::Accounts, "anyone", &shopper)
            .unwrap();
        assert!(outcome.is_denied());
    }

    #[test]
    fn test_permissions_are_per_collection() {
        let gateway = QueryGateway::new(Arc::new(MemoryStore::new()));
        let caller = Caller::with_permissions(ShopId::new("shop-1"), [Permission::ReadOrders]);

        assert!(!gateway
            .search(SearchCollection::Orders, "", &caller)
            .unwrap()
            .is_denied());
        assert!(gateway
            .search(SearchCollection::Accounts, "", &caller)
            .unwrap()
            .is_denied());
    }

    #[tokio::test]
    async fn test_hidden_products_need_create_product() {
        let store = Arc::new(MemoryStore::new());
        store.upsert(hidden_product("p1", "Secret Launch")).await.unwrap();
        let gateway = QueryGateway::new(Arc::clone(&store));
        let shop = ShopId::new("shop-1");

        let shopper = Caller::anonymous(shop.clone());
        let cursor = gateway
            .search(SearchCollection::Products, "Secret Launch", &shopper)
            .unwrap()
            .into_cursor()
            .unwrap();
        assert_eq!(cursor.count().await.unwrap(), 0);

        let merchant = Caller::with_permissions(shop, [Permission::CreateProduct]);
        let cursor = gateway
            .search(SearchCollection::Products, "Secret Launch", &merchant)
            .unwrap()
            .into_cursor()
            .unwrap();
        assert!(cursor.filter().include_hidden);
        assert_eq!(cursor.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cursor_is_lazy_and_restartable() {
        let store = Arc::new(MemoryStore::new());
        let gateway = QueryGateway::new(Arc::clone(&store));
        let admin = Caller::admin(ShopId::new("shop-1"));

        let cursor = gateway
            .search(SearchCollection::Products, "launch", &admin)
            .unwrap()
            .into_cursor()
            .unwrap();
        assert_eq!(cursor.count().await.unwrap(), 0);

        store.upsert(hidden_product("p1", "Launch A")).await.unwrap();
        store.upsert(hidden_product("p2", "Launch B")).await.unwrap();

        assert_eq!(cursor.count().await.unwrap(), 2);
        assert_eq!(cursor.fetch().await.unwrap().len(), 2);
        assert_eq!(cursor.fetch_limited(1).await.unwrap().len(), 1);
    }
}
