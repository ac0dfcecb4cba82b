//! Record builder: derives search records from source entities.
//!
//! Each source entity maps to exactly one record in its search collection,
//! keyed by the source id. Records are disposable and can be rebuilt from the
//! entity store at any time.

use std::sync::Arc;

use tracing::instrument;

use shop_search_core::transform;
use shop_search_core::{
    Account, AccountId, AccountSearchRecord, EntityRef, Order, OrderSearchRecord, Product,
    ProductSearchRecord, SearchCollection, SearchRecord,
};

use crate::error::SearchError;
use crate::store::{EntityStore, SearchStore};

/// Why a record is being (re)built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildTrigger {
    /// The source entity was just inserted.
    Created,
    /// The source entity was modified; carries the changed field paths.
    Updated(Vec<String>),
    /// Rebuild regardless of which fields changed.
    Forced,
}

impl RebuildTrigger {
    pub fn updated<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Updated(fields.into_iter().map(Into::into).collect())
    }

    /// Whether the trigger warrants writing a record for `collection`.
    #[must_use]
    pub fn requires_rebuild(&self, collection: SearchCollection) -> bool {
        match self {
            Self::Created | Self::Forced => true,
            Self::Updated(fields) => fields.iter().any(|f| collection.is_searchable_field(f)),
        }
    }

    /// Whether the trigger may have changed the top-level source field `root`.
    #[must_use]
    pub fn touches(&self, root: &str) -> bool {
        match self {
            Self::Created | Self::Forced => true,
            Self::Updated(fields) => fields
                .iter()
                .any(|f| f.split('.').next().unwrap_or(f) == root),
        }
    }
}

/// Result of a single build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A record was upserted.
    Written,
    /// No searchable field changed; nothing was written.
    Unchanged,
    /// The source entity no longer exists; nothing was written.
    SourceMissing,
}

/// Builds search records from an entity store into a search store.
pub struct RecordBuilder<E: ?Sized, S: ?Sized> {
    entities: Arc<E>,
    search: Arc<S>,
}

impl<E: ?Sized, S: ?Sized> Clone for RecordBuilder<E, S> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            search: Arc::clone(&self.search),
        }
    }
}

impl<E, S> RecordBuilder<E, S>
where
    E: EntityStore + ?Sized,
    S: SearchStore + ?Sized,
{
    #[must_use]
    pub const fn new(entities: Arc<E>, search: Arc<S>) -> Self {
        Self { entities, search }
    }

    /// Build and upsert the search record for `entity`.
    ///
    /// Order records embed their account's email addresses, so writing an
    /// account record whose `emails` may have changed also rewrites the
    /// records of that account's orders.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if reading the entity or writing the
    /// record fails. A missing entity is not an error.
    #[instrument(skip(self, entity), fields(entity = %entity))]
    pub async fn build_search_record(
        &self,
        entity: &EntityRef,
        trigger: &RebuildTrigger,
    ) -> Result<BuildOutcome, SearchError> {
        if !trigger.requires_rebuild(entity.collection()) {
            tracing::debug!("No searchable field changed, skipping");
            return Ok(BuildOutcome::Unchanged);
        }

        if !self.write_record(entity).await? {
            tracing::debug!("Source entity not found, skipping");
            return Ok(BuildOutcome::SourceMissing);
        }
        tracing::debug!("Search record written");

        if let EntityRef::Account(account_id) = entity
            && trigger.touches("emails")
        {
            let refreshed = self.refresh_account_orders(account_id).await?;
            tracing::debug!(refreshed, "Order records refreshed");
        }

        Ok(BuildOutcome::Written)
    }

    /// Rebuild every record of a search collection from the entity store,
    /// then delete records whose source entity is gone. Returns the number of
    /// records written.
    ///
    /// Records are upserted in place, so a failure partway through leaves
    /// the previous records searchable.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` on the first storage failure.
    #[instrument(skip(self))]
    pub async fn rebuild_collection(
        &self,
        collection: SearchCollection,
    ) -> Result<usize, SearchError> {
        let refs = self.entities.entity_refs(collection).await?;

        let mut written = 0;
        for entity in &refs {
            if self.write_record(entity).await? {
                written += 1;
            }
        }

        let pruned = self.search.prune(collection, &refs).await?;

        tracing::info!(written, pruned, "Search collection rebuilt");
        Ok(written)
    }

    /// Delete the search record of a removed source entity.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the delete fails.
    #[instrument(skip(self, entity), fields(entity = %entity))]
    pub async fn remove_search_record(&self, entity: &EntityRef) -> Result<bool, SearchError> {
        let removed = self.search.remove(entity).await?;
        tracing::debug!(removed, "Search record removed");
        Ok(removed)
    }

    /// Load and upsert one record. Returns `false` when the source is gone.
    async fn write_record(&self, entity: &EntityRef) -> Result<bool, SearchError> {
        match self.load_record(entity).await? {
            Some(record) => {
                self.search.upsert(record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn refresh_account_orders(&self, account_id: &AccountId) -> Result<usize, SearchError> {
        let mut refreshed = 0;
        for order_id in self.entities.orders_for_account(account_id).await? {
            if self.write_record(&EntityRef::Order(order_id)).await? {
                refreshed += 1;
            }
        }
        Ok(refreshed)
    }

    async fn load_record(&self, entity: &EntityRef) -> Result<Option<SearchRecord>, SearchError> {
        let record = match entity {
            EntityRef::Product(id) => self.entities.product(id).await?.map(|p| product_record(&p)),
            EntityRef::Account(id) => self.entities.account(id).await?.map(|a| account_record(&a)),
            EntityRef::Order(id) => match self.entities.order(id).await? {
                Some(order) => {
                    let account = match &order.account_id {
                        Some(account_id) => self.entities.account(account_id).await?,
                        None => None,
                    };
                    Some(order_record(&order, account.as_ref()))
                }
                None => None,
            },
        };
        Ok(record)
    }
}

/// Project a product into its search record.
#[must_use]
pub fn product_record(product: &Product) -> SearchRecord {
    SearchRecord::Product(ProductSearchRecord {
        product_id: product.id.clone(),
        shop_id: product.shop_id.clone(),
        title: product.title.clone(),
        handle: product.handle.clone(),
        vendor: product.vendor.clone(),
        is_visible: product.is_visible,
        metafields: transform::metafields(Some(product.metafields.as_slice())),
    })
}

/// Project an account into its search record.
#[must_use]
pub fn account_record(account: &Account) -> SearchRecord {
    SearchRecord::Account(AccountSearchRecord {
        account_id: account.id.clone(),
        shop_id: account.shop_id.clone(),
        emails: transform::emails(Some(account.emails.as_slice())),
        profile: transform::profile(Some(account.address_book.as_slice())),
    })
}

/// Project an order into its search record.
///
/// `user_emails` is the order's own email followed by the owning account's
/// addresses, without duplicates.
#[must_use]
pub fn order_record(order: &Order, account: Option<&Account>) -> SearchRecord {
    let mut user_emails: Vec<String> = Vec::new();
    let account_emails = account
        .map(|a| transform::emails(Some(a.emails.as_slice())))
        .unwrap_or_default();

    for email in order.email.iter().cloned().chain(account_emails) {
        if !email.is_empty() && !user_emails.contains(&email) {
            user_emails.push(email);
        }
    }

    let shipping = order.shipping_address.as_ref();
    let billing = order.billing_address.as_ref();

    SearchRecord::Order(OrderSearchRecord {
        order_id: order.id.clone(),
        shop_id: order.shop_id.clone(),
        shipping_name: transform::full_name(shipping),
        billing_name: transform::full_name(billing),
        shipping_phone: transform::digits_only(shipping.and_then(|a| a.phone.as_deref())),
        billing_phone: transform::digits_only(billing.and_then(|a| a.phone.as_deref())),
        user_emails,
        created_at: order.created_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shop_search_core::{Address, EmailAddress, Metafield, OrderId, ProductId, ShopId};

    use super::*;
    use crate::filter::{SearchFilter, SearchTerm};
    use crate::store::MemoryStore;

    fn product(id: &str, title: &str) -> Product {
        Product {
            id: ProductId::new(id),
            shop_id: ShopId::new("shop-1"),
            title: title.to_string(),
            handle: title.to_lowercase().replace(' ', "-"),
            vendor: None,
            is_visible: true,
            metafields: vec![Metafield::new("material", "Canvas")],
        }
    }

    fn builder() -> (Arc<MemoryStore>, RecordBuilder<MemoryStore, MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let builder = RecordBuilder::new(Arc::clone(&store), Arc::clone(&store));
        (store, builder)
    }

    #[test]
    fn test_trigger_filters_on_searchable_fields() {
        let products = SearchCollection::Products;
        assert!(RebuildTrigger::Created.requires_rebuild(products));
        assert!(RebuildTrigger::Forced.requires_rebuild(products));
        assert!(RebuildTrigger::updated(["title"]).requires_rebuild(products));
        assert!(RebuildTrigger::updated(["price", "metafields.0.value"]).requires_rebuild(products));
        assert!(!RebuildTrigger::updated(["price"]).requires_rebuild(products));
        assert!(!RebuildTrigger::updated(Vec::<String>::new()).requires_rebuild(products));
    }

    #[test]
    fn test_trigger_touches_root_field() {
        assert!(RebuildTrigger::Forced.touches("emails"));
        assert!(RebuildTrigger::updated(["emails.0.address"]).touches("emails"));
        assert!(!RebuildTrigger::updated(["addressBook.0.phone"]).touches("emails"));
        assert!(!RebuildTrigger::updated(["emailsVerified"]).touches("emails"));
    }

    #[test]
    fn test_order_record_merges_emails() {
        let account = Account {
            id: "a1".into(),
            shop_id: ShopId::new("shop-1"),
            username: None,
            emails: vec![
                EmailAddress::new("buyer@example.com"),
                EmailAddress::new("other@example.com"),
            ],
            address_book: Vec::new(),
        };
        let order = Order {
            id: OrderId::new("o1"),
            shop_id: ShopId::new("shop-1"),
            account_id: Some(account.id.clone()),
            email: Some("buyer@example.com".to_string()),
            shipping_address: Some(Address::new("Ship Name", "(555) 010-0000")),
            billing_address: None,
            created_at: Utc::now(),
        };

        let SearchRecord::Order(record) = order_record(&order, Some(&account)) else {
            panic!("expected order record");
        };
        assert_eq!(record.user_emails, vec!["buyer@example.com", "other@example.com"]);
        assert_eq!(record.shipping_name, "Ship Name");
        assert_eq!(record.shipping_phone, "5550100000");
        assert_eq!(record.billing_name, "");
        assert_eq!(record.billing_phone, "");
    }

    #[tokio::test]
    async fn test_build_writes_and_skips() {
        let (store, builder) = builder();
        store.put_product(product("p1", "Canvas Tote")).unwrap();
        let entity = EntityRef::Product(ProductId::new("p1"));

        let outcome = builder
            .build_search_record(&entity, &RebuildTrigger::updated(["price"]))
            .await
            .unwrap();
        assert_eq!(outcome, BuildOutcome::Unchanged);
        assert_eq!(store.record_count(SearchCollection::Products).unwrap(), 0);

        let outcome = builder
            .build_search_record(&entity, &RebuildTrigger::Created)
            .await
            .unwrap();
        assert_eq!(outcome, BuildOutcome::Written);
        assert_eq!(store.record_count(SearchCollection::Products).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_is_noop() {
        let (store, builder) = builder();
        let entity = EntityRef::Product(ProductId::new("missing"));

        let outcome = builder
            .build_search_record(&entity, &RebuildTrigger::Forced)
            .await
            .unwrap();
        assert_eq!(outcome, BuildOutcome::SourceMissing);
        assert_eq!(store.record_count(SearchCollection::Products).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_collection_replaces_stale_records() {
        let (store, builder) = builder();
        store.put_product(product("p1", "One")).unwrap();
        store.put_product(product("p2", "Two")).unwrap();
        builder.rebuild_collection(SearchCollection::Products).await.unwrap();

        store
            .delete_entity(&EntityRef::Product(ProductId::new("p1")))
            .unwrap();
        let written = builder.rebuild_collection(SearchCollection::Products).await.unwrap();

        assert_eq!(written, 1);
        assert_eq!(store.record_count(SearchCollection::Products).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_account_email_change_refreshes_orders() {
        let (store, builder) = builder();
        let mut account = Account {
            id: "a1".into(),
            shop_id: ShopId::new("shop-1"),
            username: None,
            emails: vec![EmailAddress::new("old@example.com")],
            address_book: Vec::new(),
        };
        store.put_account(account.clone()).unwrap();
        store
            .put_order(Order {
                id: OrderId::new("o1"),
                shop_id: ShopId::new("shop-1"),
                account_id: Some(account.id.clone()),
                email: None,
                shipping_address: None,
                billing_address: None,
                created_at: Utc::now(),
            })
            .unwrap();
        builder
            .build_search_record(&EntityRef::Order(OrderId::new("o1")), &RebuildTrigger::Created)
            .await
            .unwrap();

        account.emails = vec![EmailAddress::new("new@example.com")];
        let entity = EntityRef::Account(account.id.clone());
        store.put_account(account).unwrap();
        builder
            .build_search_record(
                &entity,
                &RebuildTrigger::updated(["emails.0.address"]),
            )
            .await
            .unwrap();

        let orders = store
            .find(
                &SearchFilter {
                    collection: SearchCollection::Orders,
                    shop_id: ShopId::new("shop-1"),
                    term: SearchTerm::new("").unwrap(),
                    include_hidden: false,
                },
                None,
            )
            .await
            .unwrap();
        let SearchRecord::Order(order) = &orders[0] else {
            panic!("expected order record");
        };
        assert_eq!(order.user_emails, vec!["new@example.com"]);
    }

    #[tokio::test]
    async fn test_remove_search_record() {
        let (store, builder) = builder();
        store.put_product(product("p1", "One")).unwrap();
        let entity = EntityRef::Product(ProductId::new("p1"));
        builder
            .build_search_record(&entity, &RebuildTrigger::Created)
            .await
            .unwrap();

        assert!(builder.remove_search_record(&entity).await.unwrap());
        assert!(!builder.remove_search_record(&entity).await.unwrap());
    }
}
