//! `SqliteDatabase` is a concrete implementation of a store payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! SQLite allows one writer at a time. Every write transaction here starts with a write statement, so the write lock
//! is held from the start and the rows it then reads cannot change under it. State guards ("not yet paid", "still
//! successful") are expressed as conditional `UPDATE ... RETURNING` statements: a guard that matches no row means the
//! precondition failed, and the current state is re-read only to pick the right error.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{inventory, new_pool, order_items, orders, payments, users};
use crate::{
    db_types::{
        InventoryPrice,
        Money,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentId,
        PaymentStatus,
        PricedOrderItem,
        ProductId,
        Roles,
        Store,
        StoreId,
        UserAccount,
        UserId,
    },
    order_objects::{OrderDetails, OrderQueryFilter},
    payment_objects::PaymentQueryFilter,
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        InventoryApiError,
        InventoryManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SeedResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Connection pool created for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date. Safe to call on every startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetails, PaymentGatewayError> {
        order.validate()?;
        let mut tx = self.pool.begin().await?;
        let header = orders::insert_order_header(&order, &mut tx).await?;
        trace!("🗃️ Order {} reserved for user {}", header.id, order.owner_id);
        let store = inventory::active_store_for_user(order.owner_id, &mut tx)
            .await?
            .ok_or(PaymentGatewayError::NoActiveStore)?;
        let mut priced = Vec::with_capacity(order.items.len());
        let mut total = Money::default();
        for line in &order.items {
            let price = inventory::fetch_inventory_price(store.id, line.product_id, &mut tx)
                .await?
                .ok_or(PaymentGatewayError::ProductUnavailable(line.product_id))?;
            let item = PricedOrderItem::new(line.product_id, &price, line.quantity)
                .ok_or(PaymentGatewayError::AmountOverflow)?;
            total = total.checked_add(item.line_total()).ok_or(PaymentGatewayError::AmountOverflow)?;
            priced.push(item);
        }
        let mut items = Vec::with_capacity(priced.len());
        for item in &priced {
            items.push(order_items::insert_item(header.id, item, &mut tx).await?);
        }
        let order = orders::finalize_order(header.id, store.id, total, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved with {} items. Total {} {}", order.id, items.len(), order.total_amount, order.currency);
        Ok(OrderDetails { order, items })
    }

    async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if payment.status == PaymentStatus::Success {
            let order_id = payment.order_id;
            if orders::mark_order_paid(order_id, &mut tx).await?.is_none() {
                let err = match orders::fetch_order(order_id, &mut tx).await? {
                    None => PaymentGatewayError::OrderNotFound(order_id),
                    Some(o) if o.is_paid => PaymentGatewayError::AlreadyPaid(order_id),
                    Some(o) => PaymentGatewayError::OrderNotPayable(order_id, o.status),
                };
                debug!("🗃️ Payment for order {order_id} was not recorded. {err}");
                return Err(err);
            }
        }
        let payment = payments::insert_payment(&payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment {} recorded for order {:?} with status {}", payment.id, payment.order_id, payment.status);
        Ok(payment)
    }

    async fn refund_payment(&self, payment_id: PaymentId, amount: Money) -> Result<(Payment, Order), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if !amount.is_positive() {
            return Err(refund_rejection(payment_id, amount, &mut tx).await?);
        }
        let payment = match payments::mark_refunded(payment_id, amount, Utc::now(), &mut tx).await? {
            Some(p) => p,
            None => return Err(refund_rejection(payment_id, amount, &mut tx).await?),
        };
        let order_id = payment.order_id.ok_or(PaymentGatewayError::NoLinkedOrder(payment_id))?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        if amount > order.total_amount {
            return Err(PaymentGatewayError::InvalidRefundAmount { requested: amount, original: order.total_amount });
        }
        let order =
            orders::mark_order_refunded(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Payment {payment_id} refunded ({amount}). Order {order_id} is now {}", order.status);
        Ok((payment, order))
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::cancel_order(order_id, &mut tx).await? {
            Some(o) => o,
            None => {
                let err = match orders::fetch_order(order_id, &mut tx).await? {
                    None => PaymentGatewayError::OrderNotFound(order_id),
                    Some(o) => PaymentGatewayError::InvalidTransition {
                        order_id,
                        from: o.status,
                        to: OrderStatusType::Cancelled,
                    },
                };
                return Err(err);
            },
        };
        tx.commit().await?;
        debug!("🗃️ Order {order_id} has been cancelled");
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Works out why a refund of `payment_id` cannot go ahead, from the current state of the payment and its order.
async fn refund_rejection(
    payment_id: PaymentId,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<PaymentGatewayError, sqlx::Error> {
    let Some(payment) = payments::fetch_payment(payment_id, conn).await? else {
        return Ok(PaymentGatewayError::PaymentNotFound(payment_id));
    };
    if payment.status != PaymentStatus::Success {
        return Ok(PaymentGatewayError::NotRefundable(payment_id, payment.status));
    }
    let Some(order_id) = payment.order_id else {
        return Ok(PaymentGatewayError::NoLinkedOrder(payment_id));
    };
    let original = orders::fetch_order(order_id, conn).await?.map(|o| o.total_amount).unwrap_or_default();
    Ok(PaymentGatewayError::InvalidRefundAmount { requested: amount, original })
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::search_payments(query, &mut conn).await?;
        Ok(payments)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn fetch_active_store_for_user(&self, user_id: UserId) -> Result<Option<Store>, InventoryApiError> {
        let mut conn = self.pool.acquire().await?;
        let store = inventory::active_store_for_user(user_id, &mut conn).await?;
        Ok(store)
    }

    async fn fetch_inventory_price(
        &self,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<Option<InventoryPrice>, InventoryApiError> {
        let mut conn = self.pool.acquire().await?;
        let price = inventory::fetch_inventory_price(store_id, product_id, &mut conn).await?;
        Ok(price)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_username(username, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_roles_for_user(&self, user_id: UserId) -> Result<Roles, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn)
            .await?
            .ok_or_else(|| AuthApiError::UserNotFound(user_id.to_string()))?;
        Ok(user.roles())
    }

    async fn create_admin_if_missing(&self, username: &str) -> Result<SeedResult, AuthApiError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthApiError::InvalidUsername("The administrator username may not be empty".into()));
        }
        let mut tx = self.pool.begin().await?;
        let inserted = users::insert_admin_if_none(username, &mut tx).await.map_err(|e| {
            let taken = e.as_database_error().map(|d| d.is_unique_violation()).unwrap_or(false);
            if taken {
                AuthApiError::InvalidUsername(format!("'{username}' already belongs to a non-administrative user"))
            } else {
                AuthApiError::from(e)
            }
        })?;
        let result = match inserted {
            Some(admin) => SeedResult::Created(admin),
            None => {
                let admin = users::first_admin(&mut tx)
                    .await?
                    .ok_or_else(|| AuthApiError::DatabaseError("Administrator vanished during seeding".into()))?;
                SeedResult::AlreadyExists(admin)
            },
        };
        tx.commit().await?;
        Ok(result)
    }
}
