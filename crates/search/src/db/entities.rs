//! Source entity reads from the `shop` schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use shop_search_core::{
    Account, AccountId, Address, EmailAddress, EntityRef, Metafield, Order, OrderId, Product,
    ProductId, SearchCollection, ShopId,
};

use super::PgStore;
use crate::store::{EntityStore, StoreError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    shop_id: ShopId,
    title: String,
    handle: String,
    vendor: Option<String>,
    is_visible: bool,
    metafields: Json<Vec<Metafield>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            title: row.title,
            handle: row.handle,
            vendor: row.vendor,
            is_visible: row.is_visible,
            metafields: row.metafields.0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    shop_id: ShopId,
    username: Option<String>,
    emails: Json<Vec<EmailAddress>>,
    address_book: Json<Vec<Address>>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            username: row.username,
            emails: row.emails.0,
            address_book: row.address_book.0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    shop_id: ShopId,
    account_id: Option<AccountId>,
    email: Option<String>,
    shipping_address: Option<Json<Address>>,
    billing_address: Option<Json<Address>>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            account_id: row.account_id,
            email: row.email,
            shipping_address: row.shipping_address.map(|a| a.0),
            billing_address: row.billing_address.map(|a| a.0),
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// EntityStore
// =============================================================================

#[async_trait]
impl EntityStore for PgStore {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, shop_id, title, handle, vendor, is_visible, metafields
            FROM shop.products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, shop_id, username, emails, address_book
            FROM shop.accounts
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, shop_id, account_id, email, shipping_address, billing_address,
                   created_at
            FROM shop.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn entity_refs(
        &self,
        collection: SearchCollection,
    ) -> Result<Vec<EntityRef>, StoreError> {
        let sql = match collection {
            SearchCollection::Products => "SELECT id FROM shop.products ORDER BY created_at, id",
            SearchCollection::Accounts => "SELECT id FROM shop.accounts ORDER BY created_at, id",
            SearchCollection::Orders => "SELECT id FROM shop.orders ORDER BY created_at, id",
        };

        let ids: Vec<String> = sqlx::query_scalar(sql).fetch_all(self.pool()).await?;

        Ok(ids
            .into_iter()
            .map(|id| match collection {
                SearchCollection::Products => EntityRef::Product(ProductId::new(id)),
                SearchCollection::Accounts => EntityRef::Account(AccountId::new(id)),
                SearchCollection::Orders => EntityRef::Order(OrderId::new(id)),
            })
            .collect())
    }

    async fn orders_for_account(&self, account: &AccountId) -> Result<Vec<OrderId>, StoreError> {
        let ids: Vec<OrderId> = sqlx::query_scalar(
            r"
            SELECT id FROM shop.orders
            WHERE account_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(account)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }
}
