use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, QueryBuilder, Row, SqliteConnection};

use super::sqlite_datetime;
use crate::{
    db_types::{BillingParty, BillingPartyKind, Money, NewPayment, OrderId, Payment, PaymentId},
    payment_objects::PaymentQueryFilter,
};

impl FromRow<'_, SqliteRow> for Payment {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let payer_kind: Option<BillingPartyKind> = row.try_get("payer_kind")?;
        let payer_id: Option<i64> = row.try_get("payer_id")?;
        let payer = match (payer_kind, payer_id) {
            (Some(kind), Some(id)) => Some(BillingParty { kind, id }),
            _ => None,
        };
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            payer,
            currency: row.try_get("currency")?,
            method: row.try_get("method")?,
            provider_transaction_id: row.try_get("provider_transaction_id")?,
            status: row.try_get("status")?,
            processed_at: row.try_get("processed_at")?,
            refund_amount: row.try_get("refund_amount")?,
            metadata: row.try_get::<Json<serde_json::Value>, _>("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub async fn insert_payment(payment: &NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id, payer_kind, payer_id, currency, method, provider_transaction_id, status, processed_at, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.payer.map(|p| p.kind))
    .bind(payment.payer.map(|p| p.id))
    .bind(&payment.currency)
    .bind(payment.method)
    .bind(&payment.provider_transaction_id)
    .bind(payment.status)
    .bind(payment.processed_at)
    .bind(payment.metadata.to_string())
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payment(id: PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// Moves a `success` payment to `refunded`. Returns `None` if the payment does not exist or is in any other state.
pub async fn mark_refunded(
    id: PaymentId,
    amount: Money,
    processed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'refunded', refund_amount = $1, processed_at = $2
            WHERE id = $3 AND status = 'success'
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(processed_at)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Fetches payments according to criteria specified in the `PaymentQueryFilter`, newest first.
///
/// When the filter carries a visibility scope, only payments on orders the user owns, or billed to the user or to
/// the user's store, are returned.
pub async fn search_payments(
    query: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT payments.* FROM payments LEFT JOIN orders ON orders.id = payments.order_id ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("payments.order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("payments.status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.as_str());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(method) = query.method {
        where_clause.push("payments.method = ");
        where_clause.push_bind_unseparated(method.as_str());
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(payments.created_at) >= ");
        where_clause.push_bind_unseparated(sqlite_datetime(&since));
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(payments.created_at) <= ");
        where_clause.push_bind_unseparated(sqlite_datetime(&until));
    }
    if let Some(scope) = query.visible_to {
        where_clause.push("(orders.owner_id = ");
        where_clause.push_bind_unseparated(scope.user_id);
        where_clause.push_unseparated(" OR (payments.payer_kind = 'user' AND payments.payer_id = ");
        where_clause.push_bind_unseparated(scope.user_id.value());
        where_clause.push_unseparated(")");
        if let Some(store_id) = scope.store_id {
            where_clause.push_unseparated(" OR (payments.payer_kind = 'store' AND payments.payer_id = ");
            where_clause.push_bind_unseparated(store_id.value());
            where_clause.push_unseparated(")");
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY payments.created_at DESC, payments.id DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Payment>();
    let payments = query.fetch_all(conn).await?;
    trace!("🗃️ Result of search_payments: {} payments", payments.len());
    Ok(payments)
}
