//! Source entities: the system of record that search records are derived from.
//!
//! Nested lists that were loosely typed documents in the shop database are
//! modelled as explicit structs with optional fields, so presence checks are
//! spelled out instead of guessed at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AccountId, OrderId, ProductId, ShopId};

/// A key/value attribute attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    pub key: String,
    pub value: String,
}

impl Metafield {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub vendor: Option<String>,
    /// Hidden products are only searchable by catalog managers.
    pub is_visible: bool,
    #[serde(default)]
    pub metafields: Vec<Metafield>,
}

/// One email address on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default)]
    pub verified: bool,
}

impl EmailAddress {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            verified: false,
        }
    }
}

/// A postal address with the contact fields search cares about.
///
/// Used both for account address-book entries and order shipping/billing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Address {
    #[must_use]
    pub fn new(full_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            phone: Some(phone.into()),
        }
    }
}

/// A customer or staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub shop_id: ShopId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub emails: Vec<EmailAddress>,
    /// Ordered address book; the first entry is the default address.
    #[serde(default)]
    pub address_book: Vec<Address>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub shop_id: ShopId,
    /// Owning account, absent for guest checkouts.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Contact email captured at checkout.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub created_at: DateTime<Utc>,
}
