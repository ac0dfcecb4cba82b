//! Search integration tests against `PostgreSQL`.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `SEARCH_DATABASE_URL` (or `DATABASE_URL`) pointing at it
//!
//! Migrations are applied on connect. Every test works in a freshly generated
//! shop, so runs do not interfere with each other or with existing data.
//!
//! Run with: cargo test -p shop-search-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;

use shop_search::db::{create_pool, run_migrations};
use shop_search::{PgStore, QueryGateway, RebuildTrigger, RecordBuilder, SearchConfig, SearchOutcome};
use shop_search_core::{
    AccountId, Address, Caller, EmailAddress, EntityRef, Metafield, OrderId, Permission,
    ProductId, SearchCollection, SearchRecord, ShopId,
};

/// A generated shop with a builder and gateway over `PgStore`.
struct PgShop {
    shop_id: ShopId,
    pool: PgPool,
    builder: RecordBuilder<PgStore, PgStore>,
    gateway: QueryGateway<PgStore>,
}

impl PgShop {
    async fn connect() -> Self {
        let config = SearchConfig::from_env().expect("Invalid search configuration");
        let url = config
            .database_url()
            .expect("SEARCH_DATABASE_URL must be set");
        let pool = create_pool(url, 2)
            .await
            .expect("Failed to connect to database");
        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            shop_id: ShopId::generate(),
            pool,
            builder: RecordBuilder::new(Arc::clone(&store), Arc::clone(&store)),
            gateway: QueryGateway::new(store),
        }
    }

    /// Another generated shop on the same database.
    fn other_shop(&self) -> Self {
        Self {
            shop_id: ShopId::generate(),
            pool: self.pool.clone(),
            builder: self.builder.clone(),
            gateway: self.gateway.clone(),
        }
    }

    fn admin(&self) -> Caller {
        Caller::admin(self.shop_id.clone())
    }

    fn shopper(&self) -> Caller {
        Caller::anonymous(self.shop_id.clone())
    }

    async fn index(&self, entity: EntityRef, trigger: RebuildTrigger) {
        self.builder
            .build_search_record(&entity, &trigger)
            .await
            .expect("Failed to build search record");
    }

    async fn create_product(&self, is_visible: bool, title: &str) -> ProductId {
        let id = ProductId::generate();
        sqlx::query(
            r"
            INSERT INTO shop.products (id, shop_id, title, handle, is_visible, metafields)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id.as_str())
        .bind(self.shop_id.as_str())
        .bind(title)
        .bind(title.to_lowercase().replace(' ', "-"))
        .bind(is_visible)
        .bind(Json(vec![
            Metafield::new("Material", "Canvas"),
            Metafield::new("Sole", "Rubber"),
        ]))
        .execute(&self.pool)
        .await
        .expect("Failed to insert product");

        self.index(EntityRef::Product(id.clone()), RebuildTrigger::Created)
            .await;
        id
    }

    async fn rename_product(&self, id: &ProductId, title: &str) {
        sqlx::query("UPDATE shop.products SET title = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(title)
            .execute(&self.pool)
            .await
            .expect("Failed to update product");

        self.index(
            EntityRef::Product(id.clone()),
            RebuildTrigger::updated(["title"]),
        )
        .await;
    }

    async fn create_account(&self, email: &str, address_book: Vec<Address>) -> AccountId {
        let id = AccountId::generate();
        sqlx::query(
            r"
            INSERT INTO shop.accounts (id, shop_id, emails, address_book)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.as_str())
        .bind(self.shop_id.as_str())
        .bind(Json(vec![EmailAddress::new(email)]))
        .bind(Json(address_book))
        .execute(&self.pool)
        .await
        .expect("Failed to insert account");

        self.index(EntityRef::Account(id.clone()), RebuildTrigger::Created)
            .await;
        id
    }

    async fn change_account_email(&self, id: &AccountId, email: &str) {
        sqlx::query("UPDATE shop.accounts SET emails = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(Json(vec![EmailAddress::new(email)]))
            .execute(&self.pool)
            .await
            .expect("Failed to update account");

        self.index(
            EntityRef::Account(id.clone()),
            RebuildTrigger::updated(["emails.0.address"]),
        )
        .await;
    }

    async fn create_order(
        &self,
        account_id: Option<&AccountId>,
        email: &str,
        shipping: Address,
        billing: Address,
    ) -> OrderId {
        let id = OrderId::generate();
        sqlx::query(
            r"
            INSERT INTO shop.orders
                (id, shop_id, account_id, email, shipping_address, billing_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id.as_str())
        .bind(self.shop_id.as_str())
        .bind(account_id.map(AccountId::as_str))
        .bind(email)
        .bind(Json(shipping))
        .bind(Json(billing))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .expect("Failed to insert order");

        self.index(EntityRef::Order(id.clone()), RebuildTrigger::Created)
            .await;
        id
    }

    /// Match count for `caller`, or `None` when the search is denied.
    async fn count_as(
        &self,
        caller: &Caller,
        collection: SearchCollection,
        term: &str,
    ) -> Option<u64> {
        match self.gateway.search(collection, term, caller).unwrap() {
            SearchOutcome::Denied => None,
            SearchOutcome::Granted(cursor) => Some(cursor.count().await.unwrap()),
        }
    }

    async fn admin_count(&self, collection: SearchCollection, term: &str) -> u64 {
        self.count_as(&self.admin(), collection, term)
            .await
            .expect("admin search was denied")
    }

    async fn admin_fetch(&self, collection: SearchCollection, term: &str) -> Vec<SearchRecord> {
        self.gateway
            .search(collection, term, &self.admin())
            .unwrap()
            .into_cursor()
            .expect("admin search was denied")
            .fetch()
            .await
            .unwrap()
    }
}

// ============================================================================
// Product Search
// ============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_product_title_matching() {
    let shop = PgShop::connect().await;
    shop.create_product(true, "Product Search Test").await;
    let shopper = shop.shopper();

    for term in ["Product Search Test", "pRoDuCt SeArCh tEsT", "Product", "rubber"] {
        let count = shop
            .count_as(&shopper, SearchCollection::Products, term)
            .await;
        assert_eq!(count, Some(1), "term {term:?}");
    }
    assert_eq!(
        shop.count_as(&shopper, SearchCollection::Products, "xxxxx")
            .await,
        Some(0)
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_hidden_product_needs_create_product() {
    let shop = PgShop::connect().await;
    shop.create_product(false, "isINVisible").await;

    let shopper = shop.shopper();
    let merchant = Caller::with_permissions(shop.shop_id.clone(), [Permission::CreateProduct]);
    assert_eq!(
        shop.count_as(&shopper, SearchCollection::Products, "isINVisible")
            .await,
        Some(0)
    );
    assert_eq!(
        shop.count_as(&merchant, SearchCollection::Products, "isINVisible")
            .await,
        Some(1)
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_like_wildcards_are_literal() {
    let shop = PgShop::connect().await;
    shop.create_product(true, "100%_off Sale").await;
    shop.create_product(true, "100 percent off").await;

    assert_eq!(shop.admin_count(SearchCollection::Products, "100%_off").await, 1);
    assert_eq!(shop.admin_count(SearchCollection::Products, "100").await, 2);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_upserts_keep_insertion_order() {
    let shop = PgShop::connect().await;
    let first = shop.create_product(true, "Alpha Tote").await;
    shop.create_product(true, "Beta Tote").await;
    shop.rename_product(&first, "Omega Tote").await;

    let titles: Vec<String> = shop
        .admin_fetch(SearchCollection::Products, "tote")
        .await
        .into_iter()
        .filter_map(|record| match record {
            SearchRecord::Product(p) => Some(p.title),
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["Omega Tote", "Beta Tote"]);

    let limited = shop
        .gateway
        .search(SearchCollection::Products, "tote", &shop.admin())
        .unwrap()
        .into_cursor()
        .unwrap()
        .fetch_limited(1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_results_are_scoped_to_shop() {
    let shop = PgShop::connect().await;
    let other = shop.other_shop();
    shop.create_product(true, "Shared Title").await;
    other.create_product(true, "Shared Title").await;
    other.create_product(true, "Shared Title Two").await;

    assert_eq!(shop.admin_count(SearchCollection::Products, "Shared").await, 1);
    assert_eq!(other.admin_count(SearchCollection::Products, "Shared").await, 2);
}

// ============================================================================
// Account Search
// ============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_account_search() {
    let shop = PgShop::connect().await;
    shop.create_account(
        "matchemail@searchtest.com",
        vec![Address::new("Jane Doe", "(555) 010-0000")],
    )
    .await;

    assert_eq!(
        shop.admin_count(SearchCollection::Accounts, "matchemail@searchtest.com")
            .await,
        1
    );
    assert_eq!(shop.admin_count(SearchCollection::Accounts, "jane").await, 1);
    assert_eq!(shop.admin_count(SearchCollection::Accounts, "5550100000").await, 1);
    assert_eq!(
        shop.count_as(&shop.shopper(), SearchCollection::Accounts, "matchemail")
            .await,
        None
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_account_without_address_book_has_no_profile() {
    let shop = PgShop::connect().await;
    shop.create_account("noprofile@searchtest.com", Vec::new())
        .await;

    let records = shop
        .admin_fetch(SearchCollection::Accounts, "noprofile")
        .await;
    let [SearchRecord::Account(account)] = records.as_slice() else {
        panic!("expected one account record, got {records:?}");
    };
    assert_eq!(account.profile, None);
    assert_eq!(account.emails, vec!["noprofile@searchtest.com"]);
}

// ============================================================================
// Order Search
// ============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_order_search() {
    let shop = PgShop::connect().await;
    shop.create_order(
        None,
        "test@example.com",
        Address::new("Ship Name", "555-0100"),
        Address::new("Bill Name", "555-0199"),
    )
    .await;

    for term in ["test@example.com", "Ship Name", "Bill Name", "biLl nAme", "5550199"] {
        assert_eq!(
            shop.admin_count(SearchCollection::Orders, term).await,
            1,
            "term {term:?}"
        );
    }
    assert_eq!(
        shop.count_as(&shop.shopper(), SearchCollection::Orders, "Ship Name")
            .await,
        None
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_pg_account_email_change_reaches_orders() {
    let shop = PgShop::connect().await;
    let account = shop.create_account("old@example.com", Vec::new()).await;
    shop.create_order(
        Some(&account),
        "",
        Address::new("Ship Name", "555-0100"),
        Address::new("Bill Name", "555-0199"),
    )
    .await;
    assert_eq!(shop.admin_count(SearchCollection::Orders, "old@example.com").await, 1);

    shop.change_account_email(&account, "new@example.com").await;

    assert_eq!(shop.admin_count(SearchCollection::Accounts, "new@example.com").await, 1);
    assert_eq!(shop.admin_count(SearchCollection::Orders, "new@example.com").await, 1);
    assert_eq!(shop.admin_count(SearchCollection::Orders, "old@example.com").await, 0);
}
