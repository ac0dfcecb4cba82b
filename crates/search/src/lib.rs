//! Shop search: search record construction and permission-gated queries.
//!
//! # Overview
//!
//! - [`RecordBuilder`] reads a source entity from an [`EntityStore`], flattens
//!   it into a [`shop_search_core::SearchRecord`] and upserts it into a
//!   [`SearchStore`].
//! - [`QueryGateway`] checks the caller's permissions and returns a lazy
//!   [`SearchCursor`] scoped to the caller's shop, or
//!   [`SearchOutcome::Denied`].
//!
//! Both sides work against the store traits, so the same code runs on the
//! in-memory [`MemoryStore`] and on [`PgStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shop_search::{MemoryStore, QueryGateway, RebuildTrigger, RecordBuilder};
//! use shop_search_core::{Caller, EntityRef, SearchCollection};
//!
//! let store = Arc::new(MemoryStore::new());
//! let builder = RecordBuilder::new(store.clone(), store.clone());
//! builder.build_search_record(&entity, &RebuildTrigger::Created).await?;
//!
//! let gateway = QueryGateway::new(store);
//! if let Some(cursor) = gateway.search(SearchCollection::Products, "tote", &caller)?.into_cursor() {
//!     let hits = cursor.fetch().await?;
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod builder;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod store;

pub use builder::{BuildOutcome, RebuildTrigger, RecordBuilder};
pub use config::{ConfigError, LogFormat, SearchConfig};
pub use db::PgStore;
pub use error::SearchError;
pub use filter::{SearchFilter, SearchTerm};
pub use gateway::{QueryGateway, SearchCursor, SearchOutcome};
pub use store::{EntityStore, MemoryStore, SearchStore, StoreError};
