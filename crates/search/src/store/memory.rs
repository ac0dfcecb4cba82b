//! In-memory store.
//!
//! Holds entities and search records behind a single `RwLock`. Records keep
//! their insertion position when upserted, so query results come back in the
//! order records were first written.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use shop_search_core::{
    Account, AccountId, EntityRef, Order, OrderId, Product, ProductId, SearchCollection,
    SearchRecord,
};

use super::{EntityStore, SearchStore, StoreError};
use crate::filter::SearchFilter;

#[derive(Debug, Default)]
struct Collections {
    products: Vec<Product>,
    accounts: Vec<Account>,
    orders: Vec<Order>,
    records: Vec<SearchRecord>,
}

/// Entity store and search store in one process-local structure.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

/// Replace the first item matching `same`, or append.
fn put_by<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

/// Remove every item matching `same`. Returns whether anything was removed.
fn remove_by<T>(items: &mut Vec<T>, same: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !same(item));
    items.len() != before
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))
    }

    /// Insert or replace a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn put_product(&self, product: Product) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let id = product.id.clone();
        put_by(&mut guard.products, product, |p| p.id == id);
        Ok(())
    }

    /// Insert or replace an account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn put_account(&self, account: Account) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let id = account.id.clone();
        put_by(&mut guard.accounts, account, |a| a.id == id);
        Ok(())
    }

    /// Insert or replace an order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn put_order(&self, order: Order) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let id = order.id.clone();
        put_by(&mut guard.orders, order, |o| o.id == id);
        Ok(())
    }

    /// Delete a source entity. Its search record, if any, is left in place.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn delete_entity(&self, entity: &EntityRef) -> Result<bool, StoreError> {
        let mut guard = self.write()?;
        let removed = match entity {
            EntityRef::Product(id) => remove_by(&mut guard.products, |p| &p.id == id),
            EntityRef::Account(id) => remove_by(&mut guard.accounts, |a| &a.id == id),
            EntityRef::Order(id) => remove_by(&mut guard.orders, |o| &o.id == id),
        };
        Ok(removed)
    }

    /// Number of records in a search collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn record_count(&self, collection: SearchCollection) -> Result<usize, StoreError> {
        Ok(self
            .read()?
            .records
            .iter()
            .filter(|r| r.collection() == collection)
            .count())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.iter().find(|p| &p.id == id).cloned())
    }

    async fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.accounts.iter().find(|a| &a.id == id).cloned())
    }

    async fn order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.iter().find(|o| &o.id == id).cloned())
    }

    async fn entity_refs(
        &self,
        collection: SearchCollection,
    ) -> Result<Vec<EntityRef>, StoreError> {
        let guard = self.read()?;
        let refs = match collection {
            SearchCollection::Products => guard
                .products
                .iter()
                .map(|p| EntityRef::Product(p.id.clone()))
                .collect(),
            SearchCollection::Accounts => guard
                .accounts
                .iter()
                .map(|a| EntityRef::Account(a.id.clone()))
                .collect(),
            SearchCollection::Orders => guard
                .orders
                .iter()
                .map(|o| EntityRef::Order(o.id.clone()))
                .collect(),
        };
        Ok(refs)
    }

    async fn orders_for_account(&self, account: &AccountId) -> Result<Vec<OrderId>, StoreError> {
        Ok(self
            .read()?
            .orders
            .iter()
            .filter(|o| o.account_id.as_ref() == Some(account))
            .map(|o| o.id.clone())
            .collect())
    }
}

#[async_trait]
impl SearchStore for MemoryStore {
    async fn upsert(&self, record: SearchRecord) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let source = record.source();
        put_by(&mut guard.records, record, |r| r.source() == source);
        Ok(())
    }

    async fn remove(&self, entity: &EntityRef) -> Result<bool, StoreError> {
        let mut guard = self.write()?;
        Ok(remove_by(&mut guard.records, |r| &r.source() == entity))
    }

    async fn prune(
        &self,
        collection: SearchCollection,
        keep: &[EntityRef],
    ) -> Result<u64, StoreError> {
        let mut guard = self.write()?;
        let before = guard.records.len();
        guard
            .records
            .retain(|r| r.collection() != collection || keep.contains(&r.source()));
        Ok((before - guard.records.len()) as u64)
    }

    async fn find(
        &self,
        filter: &SearchFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SearchRecord>, StoreError> {
        let guard = self.read()?;
        Ok(guard
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &SearchFilter) -> Result<u64, StoreError> {
        let guard = self.read()?;
        Ok(guard.records.iter().filter(|r| filter.matches(r)).count() as u64)
    }
}
