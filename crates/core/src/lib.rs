//! Shop Search Core - Shared types library.
//!
//! This crate provides the I/O-free half of shop search:
//! - source entities (products, accounts, orders) and the search records
//!   derived from them
//! - the field transformations that flatten entities into records
//! - caller permissions consulted by the search gateway
//! - account registration validation
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and traits - no I/O, no
//! database access. Storage and the search gateway live in `shop-search`.
//!
//! # Modules
//!
//! - [`types`] - Ids, entities, search records and permissions
//! - [`transform`] - Field flattening used by the record builder
//! - [`validation`] - Username, email and password rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod transform;
pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{PasswordPolicy, ValidationCode, ValidationError};
