//! Search collection reads and writes in the `search` schema.
//!
//! Find and count share one `WHERE` fragment per collection, so a cursor's
//! count always agrees with what fetch returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shop_search_core::{
    AccountId, AccountSearchRecord, EntityRef, OrderId, OrderSearchRecord, ProductId,
    ProductSearchRecord, Profile, SearchCollection, SearchRecord, ShopId,
};

use super::{PgStore, limit_param};
use crate::filter::SearchFilter;
use crate::store::{SearchStore, StoreError};

const PRODUCT_WHERE: &str = r"
    shop_id = $1
    AND ($3 OR is_visible)
    AND (
        $2::text IS NULL
        OR title ILIKE $2
        OR EXISTS (SELECT 1 FROM unnest(metafields) AS m(value) WHERE m.value ILIKE $2)
    )";

const ACCOUNT_WHERE: &str = r"
    shop_id = $1
    AND (
        $2::text IS NULL
        OR first_name ILIKE $2
        OR last_name ILIKE $2
        OR phone ILIKE $2
        OR EXISTS (SELECT 1 FROM unnest(emails) AS e(value) WHERE e.value ILIKE $2)
    )";

const ORDER_WHERE: &str = r"
    shop_id = $1
    AND (
        $2::text IS NULL
        OR shipping_name ILIKE $2
        OR billing_name ILIKE $2
        OR shipping_phone ILIKE $2
        OR billing_phone ILIKE $2
        OR EXISTS (SELECT 1 FROM unnest(user_emails) AS e(value) WHERE e.value ILIKE $2)
    )";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductSearchRow {
    product_id: ProductId,
    shop_id: ShopId,
    title: String,
    handle: String,
    vendor: Option<String>,
    is_visible: bool,
    metafields: Vec<String>,
}

impl From<ProductSearchRow> for SearchRecord {
    fn from(row: ProductSearchRow) -> Self {
        Self::Product(ProductSearchRecord {
            product_id: row.product_id,
            shop_id: row.shop_id,
            title: row.title,
            handle: row.handle,
            vendor: row.vendor,
            is_visible: row.is_visible,
            metafields: row.metafields,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountSearchRow {
    account_id: AccountId,
    shop_id: ShopId,
    emails: Vec<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
}

impl From<AccountSearchRow> for SearchRecord {
    fn from(row: AccountSearchRow) -> Self {
        // A profile is written with all three columns or none.
        let profile = row.first_name.map(|first_name| Profile {
            first_name,
            last_name: row.last_name.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
        });

        Self::Account(AccountSearchRecord {
            account_id: row.account_id,
            shop_id: row.shop_id,
            emails: row.emails,
            profile,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSearchRow {
    order_id: OrderId,
    shop_id: ShopId,
    shipping_name: String,
    billing_name: String,
    shipping_phone: String,
    billing_phone: String,
    user_emails: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderSearchRow> for SearchRecord {
    fn from(row: OrderSearchRow) -> Self {
        Self::Order(OrderSearchRecord {
            order_id: row.order_id,
            shop_id: row.shop_id,
            shipping_name: row.shipping_name,
            billing_name: row.billing_name,
            shipping_phone: row.shipping_phone,
            billing_phone: row.billing_phone,
            user_emails: row.user_emails,
            created_at: row.created_at,
        })
    }
}

const fn table(collection: SearchCollection) -> &'static str {
    match collection {
        SearchCollection::Products => "search.product_search",
        SearchCollection::Accounts => "search.account_search",
        SearchCollection::Orders => "search.order_search",
    }
}

/// Column holding the source entity id.
const fn source_column(collection: SearchCollection) -> &'static str {
    match collection {
        SearchCollection::Products => "product_id",
        SearchCollection::Accounts => "account_id",
        SearchCollection::Orders => "order_id",
    }
}

// =============================================================================
// Upserts
// =============================================================================

impl PgStore {
    async fn upsert_product(&self, record: ProductSearchRecord) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO search.product_search
                (product_id, shop_id, title, handle, vendor, is_visible, metafields)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id) DO UPDATE SET
                shop_id = EXCLUDED.shop_id,
                title = EXCLUDED.title,
                handle = EXCLUDED.handle,
                vendor = EXCLUDED.vendor,
                is_visible = EXCLUDED.is_visible,
                metafields = EXCLUDED.metafields,
                updated_at = NOW()
            ",
        )
        .bind(&record.product_id)
        .bind(&record.shop_id)
        .bind(&record.title)
        .bind(&record.handle)
        .bind(&record.vendor)
        .bind(record.is_visible)
        .bind(&record.metafields)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn upsert_account(&self, record: AccountSearchRecord) -> Result<(), StoreError> {
        let (first_name, last_name, phone) = match record.profile {
            Some(p) => (Some(p.first_name), Some(p.last_name), Some(p.phone)),
            None => (None, None, None),
        };

        sqlx::query(
            r"
            INSERT INTO search.account_search
                (account_id, shop_id, emails, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (account_id) DO UPDATE SET
                shop_id = EXCLUDED.shop_id,
                emails = EXCLUDED.emails,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone = EXCLUDED.phone,
                updated_at = NOW()
            ",
        )
        .bind(&record.account_id)
        .bind(&record.shop_id)
        .bind(&record.emails)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn upsert_order(&self, record: OrderSearchRecord) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO search.order_search
                (order_id, shop_id, shipping_name, billing_name, shipping_phone,
                 billing_phone, user_emails, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id) DO UPDATE SET
                shop_id = EXCLUDED.shop_id,
                shipping_name = EXCLUDED.shipping_name,
                billing_name = EXCLUDED.billing_name,
                shipping_phone = EXCLUDED.shipping_phone,
                billing_phone = EXCLUDED.billing_phone,
                user_emails = EXCLUDED.user_emails,
                created_at = EXCLUDED.created_at,
                updated_at = NOW()
            ",
        )
        .bind(&record.order_id)
        .bind(&record.shop_id)
        .bind(&record.shipping_name)
        .bind(&record.billing_name)
        .bind(&record.shipping_phone)
        .bind(&record.billing_phone)
        .bind(&record.user_emails)
        .bind(record.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}

// =============================================================================
// SearchStore
// =============================================================================

#[async_trait]
impl SearchStore for PgStore {
    async fn upsert(&self, record: SearchRecord) -> Result<(), StoreError> {
        match record {
            SearchRecord::Product(r) => self.upsert_product(r).await,
            SearchRecord::Account(r) => self.upsert_account(r).await,
            SearchRecord::Order(r) => self.upsert_order(r).await,
        }
    }

    async fn remove(&self, entity: &EntityRef) -> Result<bool, StoreError> {
        let sql = match entity {
            EntityRef::Product(_) => "DELETE FROM search.product_search WHERE product_id = $1",
            EntityRef::Account(_) => "DELETE FROM search.account_search WHERE account_id = $1",
            EntityRef::Order(_) => "DELETE FROM search.order_search WHERE order_id = $1",
        };

        let result = sqlx::query(sql)
            .bind(entity.id())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn prune(
        &self,
        collection: SearchCollection,
        keep: &[EntityRef],
    ) -> Result<u64, StoreError> {
        let ids: Vec<String> = keep
            .iter()
            .filter(|entity| entity.collection() == collection)
            .map(|entity| entity.id().to_string())
            .collect();

        let sql = format!(
            "DELETE FROM {} WHERE {} <> ALL($1)",
            table(collection),
            source_column(collection)
        );
        let result = sqlx::query(&sql).bind(ids).execute(self.pool()).await?;
        Ok(result.rows_affected())
    }

    async fn find(
        &self,
        filter: &SearchFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SearchRecord>, StoreError> {
        let pattern = filter.term.like_pattern();
        let limit = limit_param(limit);

        let records: Vec<SearchRecord> = match filter.collection {
            SearchCollection::Products => {
                let sql = format!(
                    "SELECT product_id, shop_id, title, handle, vendor, is_visible, metafields
                     FROM search.product_search WHERE {PRODUCT_WHERE}
                     ORDER BY seq LIMIT $4"
                );
                sqlx::query_as::<_, ProductSearchRow>(&sql)
                    .bind(&filter.shop_id)
                    .bind(pattern)
                    .bind(filter.include_hidden)
                    .bind(limit)
                    .fetch_all(self.pool())
                    .await?
                    .into_iter()
                    .map(SearchRecord::from)
                    .collect()
            }
            SearchCollection::Accounts => {
                let sql = format!(
                    "SELECT account_id, shop_id, emails, first_name, last_name, phone
                     FROM search.account_search WHERE {ACCOUNT_WHERE}
                     ORDER BY seq LIMIT $3"
                );
                sqlx::query_as::<_, AccountSearchRow>(&sql)
                    .bind(&filter.shop_id)
                    .bind(pattern)
                    .bind(limit)
                    .fetch_all(self.pool())
                    .await?
                    .into_iter()
                    .map(SearchRecord::from)
                    .collect()
            }
            SearchCollection::Orders => {
                let sql = format!(
                    "SELECT order_id, shop_id, shipping_name, billing_name, shipping_phone,
                            billing_phone, user_emails, created_at
                     FROM search.order_search WHERE {ORDER_WHERE}
                     ORDER BY seq LIMIT $3"
                );
                sqlx::query_as::<_, OrderSearchRow>(&sql)
                    .bind(&filter.shop_id)
                    .bind(pattern)
                    .bind(limit)
                    .fetch_all(self.pool())
                    .await?
                    .into_iter()
                    .map(SearchRecord::from)
                    .collect()
            }
        };

        Ok(records)
    }

    async fn count(&self, filter: &SearchFilter) -> Result<u64, StoreError> {
        let pattern = filter.term.like_pattern();

        let count: i64 = match filter.collection {
            SearchCollection::Products => {
                let sql = format!("SELECT COUNT(*) FROM search.product_search WHERE {PRODUCT_WHERE}");
                sqlx::query_scalar(&sql)
                    .bind(&filter.shop_id)
                    .bind(pattern)
                    .bind(filter.include_hidden)
                    .fetch_one(self.pool())
                    .await?
            }
            SearchCollection::Accounts => {
                let sql = format!("SELECT COUNT(*) FROM search.account_search WHERE {ACCOUNT_WHERE}");
                sqlx::query_scalar(&sql)
                    .bind(&filter.shop_id)
                    .bind(pattern)
                    .fetch_one(self.pool())
                    .await?
            }
            SearchCollection::Orders => {
                let sql = format!("SELECT COUNT(*) FROM search.order_search WHERE {ORDER_WHERE}");
                sqlx::query_scalar(&sql)
                    .bind(&filter.shop_id)
                    .bind(pattern)
                    .fetch_one(self.pool())
                    .await?
            }
        };

        u64::try_from(count)
            .map_err(|_| StoreError::DataCorruption(format!("negative row count: {count}")))
    }
}
