use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, OrderItem, Payment, PaymentId, UserAccount, UserId},
    order_objects::OrderQueryFilter,
    payment_objects::PaymentQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Read access to orders, payments and the users that own them.
///
/// None of these methods apply any caller scoping on their own. Scoping is expressed through the query filters (see
/// [`OrderQueryFilter::with_owner_id`] and [`PaymentQueryFilter::visible_to`]) and applied by the
/// [`crate::AccountApi`].
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, AccountApiError>;

    /// The items of an order, in the order they were requested.
    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, AccountApiError>;

    async fn fetch_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, AccountApiError>;

    /// Every payment attempt made against the order, oldest first.
    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, AccountApiError>;

    /// Orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;

    /// Payments matching the filter, newest first.
    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, AccountApiError>;
}
