//! Core types for shop search.
//!
//! This module provides type-safe ids, the source entities, the search
//! records derived from them, and caller permissions.

pub mod email;
pub mod entity;
pub mod id;
pub mod permission;
pub mod record;

pub use email::{Email, EmailError};
pub use entity::{Account, Address, EmailAddress, Metafield, Order, Product};
pub use id::*;
pub use permission::{Caller, Permission, PermissionOracle};
pub use record::{
    AccountSearchRecord, EntityRef, OrderSearchRecord, ProductSearchRecord, Profile,
    SearchCollection, SearchRecord,
};
