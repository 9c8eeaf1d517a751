//! Seed rows for the collaborator tables (stores, users, products and inventory).
//!
//! Catalog and user management are outside the payment engine, so these go straight to the database.
use crate::{
    db_types::{Money, ProductId, StoreId, UserAccount, UserId},
    sqlite_db::users,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};

pub async fn create_store(db: &SqliteDatabase, code: &str, active: bool) -> StoreId {
    let status = if active { "active" } else { "inactive" };
    let mut tx = db.pool().begin().await.expect("Error starting transaction");
    let id: i64 = sqlx::query_scalar("INSERT INTO stores (name, code, status) VALUES ($1, $1, $2) RETURNING id")
        .bind(code)
        .bind(status)
        .fetch_one(&mut *tx)
        .await
        .expect("Error inserting store");
    tx.commit().await.expect("Error committing store");
    StoreId(id)
}

pub async fn create_user(db: &SqliteDatabase, username: &str, is_admin: bool, store_id: Option<StoreId>) -> UserAccount {
    let mut tx = db.pool().begin().await.expect("Error starting transaction");
    let user = users::insert_user(username, is_admin, store_id, &mut tx).await.expect("Error inserting user");
    tx.commit().await.expect("Error committing user");
    user
}

pub async fn create_product(db: &SqliteDatabase, name: &str, sku: &str) -> ProductId {
    let mut tx = db.pool().begin().await.expect("Error starting transaction");
    let id: i64 = sqlx::query_scalar("INSERT INTO products (name, sku) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(sku)
        .fetch_one(&mut *tx)
        .await
        .expect("Error inserting product");
    tx.commit().await.expect("Error committing product");
    ProductId(id)
}

pub async fn stock_product(db: &SqliteDatabase, store_id: StoreId, product_id: ProductId, price: Money, quantity: i64) {
    sqlx::query("INSERT INTO store_inventory (store_id, product_id, price, quantity) VALUES ($1, $2, $3, $4)")
        .bind(store_id)
        .bind(product_id)
        .bind(price)
        .bind(quantity)
        .execute(db.pool())
        .await
        .expect("Error stocking product");
}

pub async fn delete_product(db: &SqliteDatabase, product_id: ProductId) {
    sqlx::query("UPDATE products SET is_deleted = 1 WHERE id = $1")
        .bind(product_id)
        .execute(db.pool())
        .await
        .expect("Error deleting product");
}

/// A store with two stocked products, a member user, an outsider with no store, and an administrator.
#[derive(Debug, Clone)]
pub struct StoreFixture {
    pub store_id: StoreId,
    pub admin: UserId,
    pub alice: UserId,
    pub bob: UserId,
    pub outsider: UserId,
    /// Priced at 10.00
    pub product_a: ProductId,
    /// Priced at 5.00
    pub product_b: ProductId,
    /// Exists in the catalog but is not stocked by the store
    pub product_c: ProductId,
}

pub async fn standard_fixture(db: &SqliteDatabase) -> StoreFixture {
    let store_id = create_store(db, "HN-01", true).await;
    let admin = create_user(db, "root", true, None).await.id;
    let alice = create_user(db, "alice", false, Some(store_id)).await.id;
    let bob = create_user(db, "bob", false, Some(store_id)).await.id;
    let outsider = create_user(db, "outsider", false, None).await.id;
    let product_a = create_product(db, "Product A", "SKU-A").await;
    let product_b = create_product(db, "Product B", "SKU-B").await;
    let product_c = create_product(db, "Product C", "SKU-C").await;
    stock_product(db, store_id, product_a, Money::from_major(10), 100).await;
    stock_product(db, store_id, product_b, Money::from_major(5), 100).await;
    StoreFixture { store_id, admin, alice, bob, outsider, product_a, product_b, product_c }
}

/// A fresh migrated database at a random path, loaded with [`standard_fixture`]. Returns the database URL too, so
/// that callers can drop it afterwards.
pub async fn seeded_database() -> (String, SqliteDatabase, StoreFixture) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    let fixture = standard_fixture(&db).await;
    (url, db, fixture)
}
