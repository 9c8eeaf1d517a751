use sqlx::SqliteConnection;

use crate::db_types::{OrderId, OrderItem, PricedOrderItem};

pub async fn insert_item(
    order_id: OrderId,
    item: &PricedOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, product_name, sku, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(&item.sku)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.line_total())
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_items_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
