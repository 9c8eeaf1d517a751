use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use super::sqlite_datetime;
use crate::{
    db_types::{Money, NewOrder, Order, OrderId, StoreId},
    order_objects::OrderQueryFilter,
};

/// Inserts the order row with a zero total. This must be the first statement of the order creation transaction, since
/// it is what takes SQLite's write lock.
pub async fn insert_order_header(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (owner_id, currency, shipping_address, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.owner_id)
    .bind(&order.currency)
    .bind(&order.shipping_address)
    .bind(order.metadata.to_string())
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Records the pricing store and the total for a freshly inserted order. Only called inside the creation transaction.
pub async fn finalize_order(
    id: OrderId,
    store_id: StoreId,
    total: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET store_id = $1, total_amount = $2 WHERE id = $3 RETURNING *")
        .bind(store_id)
        .bind(total)
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in descending order (newest first)
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(owner_id) = query.owner_id {
        where_clause.push("owner_id = ");
        where_clause.push_bind_unseparated(owner_id);
    }
    if let Some(store_id) = query.store_id {
        where_clause.push("store_id = ");
        where_clause.push_bind_unseparated(store_id);
    }
    if let Some(currency) = query.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if let Some(is_paid) = query.is_paid {
        where_clause.push("is_paid = ");
        where_clause.push_bind_unseparated(is_paid);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.as_str());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= ");
        where_clause.push_bind_unseparated(sqlite_datetime(&since));
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= ");
        where_clause.push_bind_unseparated(sqlite_datetime(&until));
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}

/// Marks an unpaid `pending` or `processing` order as paid, moving `pending` to `processing`.
///
/// The guard and the write are a single statement, so of two concurrent callers only one gets `Some`.
pub async fn mark_order_paid(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET is_paid = 1,
                status = CASE WHEN status = 'pending' THEN 'processing' ELSE status END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND is_paid = 0 AND status IN ('pending', 'processing')
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Clears the paid flag after a refund. Open orders become `refunded`; terminal orders keep their status.
pub async fn mark_order_refunded(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET is_paid = 0,
                status = CASE WHEN status IN ('pending', 'processing') THEN 'refunded' ELSE status END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Cancels an open order. Returns `None` if the order does not exist or is not `pending`/`processing`.
pub async fn cancel_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = 'cancelled', is_paid = 0, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('pending', 'processing')
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
