use thiserror::Error;

use crate::{
    db_types::{
        Money,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentId,
        PaymentStatus,
        ProductId,
    },
    order_objects::OrderDetails,
    provider::ProviderError,
    traits::{AccountApiError, AccountManagement, InventoryApiError},
};

/// The write side of the payment engine.
///
/// Implementations must make every method a single atomic unit: either all of its rows are written, or none are.
/// Where a method is guarded by a state precondition (e.g. "order not yet paid"), the guard must be part of the same
/// atomic write so that two concurrent callers cannot both pass it.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates an order and all of its items in one transaction.
    ///
    /// Prices come from the inventory of the owner's active store, read inside the same transaction as the inserts.
    /// * `NoActiveStore` if the owner has no active store.
    /// * `ProductUnavailable` if any product is not stocked by that store. Nothing is persisted in this case.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetails, PaymentGatewayError>;

    /// Persists a payment attempt.
    ///
    /// For a `Success` payment, the linked order is marked paid (and moved from `pending` to `processing`) in the same
    /// transaction. If the order was paid, or left the payable states, after the caller checked it, the call fails with
    /// `AlreadyPaid` / `OrderNotPayable` and nothing is written.
    ///
    /// A `Failed` payment is stored for audit and the order is left untouched.
    async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError>;

    /// Marks a successful payment as refunded and reverts its order to unpaid, in one transaction.
    /// Returns the updated payment and order.
    async fn refund_payment(&self, payment_id: PaymentId, amount: Money) -> Result<(Payment, Order), PaymentGatewayError>;

    /// Moves a `pending` or `processing` order to `cancelled` and clears its paid flag.
    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, PaymentGatewayError>;

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("An order must contain at least one item")]
    EmptyOrder,
    #[error("Invalid quantity {quantity} for product {product_id}. Quantities must be at least 1")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },
    #[error("The order total is too large to be represented")]
    AmountOverflow,
    #[error("The caller is not associated with an active store")]
    NoActiveStore,
    #[error("Product {0} is not available in the store's inventory")]
    ProductUnavailable(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(PaymentId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} has already been paid")]
    AlreadyPaid(OrderId),
    #[error("Order {0} cannot be paid while it is {1}")]
    OrderNotPayable(OrderId, OrderStatusType),
    #[error("The amount to charge must be positive, but the order total is {0}")]
    NonPositiveAmount(Money),
    #[error("The charge amount is derived from the order and may not be supplied by the client")]
    ClientSuppliedAmount,
    #[error("Order {order_id} is priced in {expected} and cannot be charged in {requested}")]
    CurrencyMismatch { order_id: OrderId, requested: String, expected: String },
    #[error("Payment {0} cannot be refunded because it is {1}")]
    NotRefundable(PaymentId, PaymentStatus),
    #[error("Payment {0} is not linked to an order")]
    NoLinkedOrder(PaymentId),
    #[error("Invalid refund amount {requested}. It must be positive and no more than {original}")]
    InvalidRefundAmount { requested: Money, original: Money },
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Forbidden. {0}")]
    Forbidden(String),
    #[error("The payment provider failed. {0}")]
    ProviderError(#[from] ProviderError),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
    #[error("{0}")]
    InventoryError(#[from] InventoryApiError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
