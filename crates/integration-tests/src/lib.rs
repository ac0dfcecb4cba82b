//! Integration test fixtures for shop search.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shop-search-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `search_results` - Record building and permission-gated search
//! - `account_validation` - Registration field rules
//! - `pg_search` - The same search scenarios against `PostgreSQL` (ignored
//!   by default; needs `SEARCH_DATABASE_URL`, run with `-- --ignored`)
//!
//! [`TestShop`] runs against [`MemoryStore`]; `pg_search` drives `PgStore`
//! through the same builder and gateway.

use std::sync::Arc;

use chrono::Utc;

use shop_search::{
    MemoryStore, QueryGateway, RebuildTrigger, RecordBuilder, SearchError, StoreError,
};
use shop_search_core::{
    Account, AccountId, Address, Caller, EmailAddress, EntityRef, Metafield, Order, OrderId,
    Permission, Product, ProductId, ShopId,
};

/// A shop backed by an in-memory store, with a builder and gateway wired to it.
pub struct TestShop {
    pub shop_id: ShopId,
    pub store: Arc<MemoryStore>,
    pub builder: RecordBuilder<MemoryStore, MemoryStore>,
    pub gateway: QueryGateway<MemoryStore>,
}

impl TestShop {
    #[must_use]
    pub fn new(shop_id: &str) -> Self {
        Self::with_store(shop_id, Arc::new(MemoryStore::new()))
    }

    /// A second shop sharing the same store.
    #[must_use]
    pub fn with_store(shop_id: &str, store: Arc<MemoryStore>) -> Self {
        Self {
            shop_id: ShopId::new(shop_id),
            builder: RecordBuilder::new(Arc::clone(&store), Arc::clone(&store)),
            gateway: QueryGateway::new(Arc::clone(&store)),
            store,
        }
    }

    /// A caller holding no permissions.
    #[must_use]
    pub fn shopper(&self) -> Caller {
        Caller::anonymous(self.shop_id.clone())
    }

    /// A caller with full administrative access to this shop.
    #[must_use]
    pub fn admin(&self) -> Caller {
        Caller::admin(self.shop_id.clone())
    }

    #[must_use]
    pub fn caller_with(&self, permission: Permission) -> Caller {
        Caller::with_permissions(self.shop_id.clone(), [permission])
    }

    /// Insert a product with canvas/rubber metafields and index it.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the store fails.
    pub async fn create_product(
        &self,
        is_visible: bool,
        title: &str,
    ) -> Result<ProductId, SearchError> {
        let product = Product {
            id: ProductId::generate(),
            shop_id: self.shop_id.clone(),
            title: title.to_string(),
            handle: title.to_lowercase().replace(' ', "-"),
            vendor: Some("Test Vendor".to_string()),
            is_visible,
            metafields: vec![
                Metafield::new("Material", "Canvas"),
                Metafield::new("Sole", "Rubber"),
            ],
        };
        let id = product.id.clone();
        self.store.put_product(product)?;
        self.index(&EntityRef::Product(id.clone()), &RebuildTrigger::Created)
            .await?;
        Ok(id)
    }

    /// Insert an account without indexing it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    pub fn create_account(
        &self,
        email: &str,
        address_book: Vec<Address>,
    ) -> Result<AccountId, StoreError> {
        let account = Account {
            id: AccountId::generate(),
            shop_id: self.shop_id.clone(),
            username: None,
            emails: vec![EmailAddress::new(email)],
            address_book,
        };
        let id = account.id.clone();
        self.store.put_account(account)?;
        Ok(id)
    }

    /// Insert an order and index it.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the store fails.
    pub async fn create_order(
        &self,
        account_id: Option<AccountId>,
        email: &str,
        shipping_name: &str,
        billing_name: &str,
    ) -> Result<OrderId, SearchError> {
        let order = Order {
            id: OrderId::generate(),
            shop_id: self.shop_id.clone(),
            account_id,
            email: Some(email.to_string()),
            shipping_address: Some(Address::new(shipping_name, "555-0100")),
            billing_address: Some(Address::new(billing_name, "555-0199")),
            created_at: Utc::now(),
        };
        let id = order.id.clone();
        self.store.put_order(order)?;
        self.index(&EntityRef::Order(id.clone()), &RebuildTrigger::Created)
            .await?;
        Ok(id)
    }

    /// Build the search record for an entity.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the store fails.
    pub async fn index(
        &self,
        entity: &EntityRef,
        trigger: &RebuildTrigger,
    ) -> Result<(), SearchError> {
        self.builder.build_search_record(entity, trigger).await?;
        Ok(())
    }
}
