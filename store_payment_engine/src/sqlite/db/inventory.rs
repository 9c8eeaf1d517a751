use sqlx::SqliteConnection;

use crate::db_types::{InventoryPrice, ProductId, Store, StoreId, UserId};

pub async fn active_store_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<Store>, sqlx::Error> {
    let store = sqlx::query_as(
        r#"
            SELECT stores.* FROM stores
            JOIN users ON users.store_id = stores.id
            WHERE users.id = $1 AND stores.status = 'active' AND stores.is_deleted = 0
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(store)
}

pub async fn fetch_inventory_price(
    store_id: StoreId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryPrice>, sqlx::Error> {
    let price = sqlx::query_as(
        r#"
            SELECT
                store_inventory.store_id AS store_id,
                store_inventory.product_id AS product_id,
                products.name AS product_name,
                products.sku AS sku,
                store_inventory.price AS unit_price,
                store_inventory.quantity AS quantity_available
            FROM store_inventory
            JOIN products ON products.id = store_inventory.product_id
            WHERE store_inventory.store_id = $1 AND store_inventory.product_id = $2 AND products.is_deleted = 0
        "#,
    )
    .bind(store_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(price)
}
