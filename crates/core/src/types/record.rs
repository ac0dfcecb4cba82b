//! Search records: denormalized projections of source entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AccountId, OrderId, ProductId, ShopId};

/// The search collections, one per searchable entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchCollection {
    Products,
    Accounts,
    Orders,
}

impl SearchCollection {
    /// Every collection, in rebuild order.
    pub const ALL: [Self; 3] = [Self::Products, Self::Accounts, Self::Orders];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Accounts => "accounts",
            Self::Orders => "orders",
        }
    }

    /// Top-level source fields whose change requires the record to be rebuilt.
    #[must_use]
    pub const fn searchable_fields(self) -> &'static [&'static str] {
        match self {
            Self::Products => &[
                "title",
                "handle",
                "vendor",
                "isVisible",
                "metafields",
                "shopId",
            ],
            Self::Accounts => &["emails", "addressBook", "shopId"],
            Self::Orders => &[
                "email",
                "shippingAddress",
                "billingAddress",
                "accountId",
                "shopId",
            ],
        }
    }

    /// Whether a changed field path participates in search.
    ///
    /// Dotted paths are matched by their first segment, so `emails.0.address`
    /// counts as a change to `emails`.
    #[must_use]
    pub fn is_searchable_field(self, path: &str) -> bool {
        let root = path.split('.').next().unwrap_or(path);
        self.searchable_fields().contains(&root)
    }
}

impl std::fmt::Display for SearchCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchCollection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" | "product" => Ok(Self::Products),
            "accounts" | "account" => Ok(Self::Accounts),
            "orders" | "order" => Ok(Self::Orders),
            _ => Err(format!("invalid search collection: {s}")),
        }
    }
}

/// A typed reference to a source entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Product(ProductId),
    Account(AccountId),
    Order(OrderId),
}

impl EntityRef {
    /// The collection holding this entity's search record.
    #[must_use]
    pub const fn collection(&self) -> SearchCollection {
        match self {
            Self::Product(_) => SearchCollection::Products,
            Self::Account(_) => SearchCollection::Accounts,
            Self::Order(_) => SearchCollection::Orders,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Product(id) => id.as_str(),
            Self::Account(id) => id.as_str(),
            Self::Order(id) => id.as_str(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection(), self.id())
    }
}

/// Name and phone parsed from an account's default address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    /// Digits only.
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchRecord {
    pub product_id: ProductId,
    pub shop_id: ShopId,
    pub title: String,
    pub handle: String,
    pub vendor: Option<String>,
    pub is_visible: bool,
    /// Metafield values in source order.
    pub metafields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSearchRecord {
    pub account_id: AccountId,
    pub shop_id: ShopId,
    pub emails: Vec<String>,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearchRecord {
    pub order_id: OrderId,
    pub shop_id: ShopId,
    pub shipping_name: String,
    pub billing_name: String,
    pub shipping_phone: String,
    pub billing_phone: String,
    pub user_emails: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A record in one of the search collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum SearchRecord {
    Product(ProductSearchRecord),
    Account(AccountSearchRecord),
    Order(OrderSearchRecord),
}

impl SearchRecord {
    #[must_use]
    pub const fn collection(&self) -> SearchCollection {
        match self {
            Self::Product(_) => SearchCollection::Products,
            Self::Account(_) => SearchCollection::Accounts,
            Self::Order(_) => SearchCollection::Orders,
        }
    }

    /// Reference to the source entity this record was built from.
    #[must_use]
    pub fn source(&self) -> EntityRef {
        match self {
            Self::Product(r) => EntityRef::Product(r.product_id.clone()),
            Self::Account(r) => EntityRef::Account(r.account_id.clone()),
            Self::Order(r) => EntityRef::Order(r.order_id.clone()),
        }
    }

    #[must_use]
    pub const fn shop_id(&self) -> &ShopId {
        match self {
            Self::Product(r) => &r.shop_id,
            Self::Account(r) => &r.shop_id,
            Self::Order(r) => &r.shop_id,
        }
    }

    /// Hidden products are the only records that can be invisible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        match self {
            Self::Product(r) => r.is_visible,
            Self::Account(_) | Self::Order(_) => true,
        }
    }

    /// The field values a search term is matched against.
    #[must_use]
    pub fn matchable_values(&self) -> Vec<&str> {
        match self {
            Self::Product(r) => std::iter::once(r.title.as_str())
                .chain(r.metafields.iter().map(String::as_str))
                .collect(),
            Self::Account(r) => {
                let mut values: Vec<&str> = r.emails.iter().map(String::as_str).collect();
                if let Some(profile) = &r.profile {
                    values.extend([
                        profile.first_name.as_str(),
                        profile.last_name.as_str(),
                        profile.phone.as_str(),
                    ]);
                }
                values
            }
            Self::Order(r) => [
                r.shipping_name.as_str(),
                r.billing_name.as_str(),
                r.shipping_phone.as_str(),
                r.billing_phone.as_str(),
            ]
            .into_iter()
                .chain(r.user_emails.iter().map(String::as_str))
                .collect(),
        }
    }
}
