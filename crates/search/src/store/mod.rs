//! Storage seams for source entities and search collections.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`] - in-process, used by tests and local tooling
//! - [`crate::db::PgStore`] - `PostgreSQL`, used in production

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use shop_search_core::{
    Account, AccountId, EntityRef, Order, OrderId, Product, ProductId, SearchCollection,
    SearchRecord,
};

use crate::filter::SearchFilter;

pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The store cannot serve requests (e.g. a poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the system of record.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    async fn order(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Every entity of the collection's type, in insertion order.
    async fn entity_refs(&self, collection: SearchCollection)
    -> Result<Vec<EntityRef>, StoreError>;

    /// Orders placed by `account`, in insertion order.
    async fn orders_for_account(&self, account: &AccountId) -> Result<Vec<OrderId>, StoreError>;
}

/// The search collections.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Insert or replace the record for its source entity.
    async fn upsert(&self, record: SearchRecord) -> Result<(), StoreError>;

    /// Delete the record for `entity`. Returns whether one existed.
    async fn remove(&self, entity: &EntityRef) -> Result<bool, StoreError>;

    /// Delete every record in `collection` whose source is not in `keep`.
    /// Returns the number removed.
    async fn prune(
        &self,
        collection: SearchCollection,
        keep: &[EntityRef],
    ) -> Result<u64, StoreError>;

    /// Matching records in insertion order, at most `limit` when given.
    async fn find(
        &self,
        filter: &SearchFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SearchRecord>, StoreError>;

    async fn count(&self, filter: &SearchFilter) -> Result<u64, StoreError>;
}
