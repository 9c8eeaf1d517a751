use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    order_objects::OrderDetails,
    spe_api::caller::Caller,
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

/// `OrderFlowApi` manages the order lifecycle: creation from inventory prices, retrieval and cancellation.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Creates a new order for `order.owner_id`.
    ///
    /// Every line is priced from the inventory of the owner's active store. The order total is the sum of the line
    /// totals. Nothing is stored unless every line could be priced.
    pub async fn create_order(&self, order: NewOrder) -> Result<OrderDetails, PaymentGatewayError> {
        order.validate()?;
        let owner = order.owner_id;
        let details = self.db.insert_order(order).await?;
        info!(
            "🔄️📦️ Order {} created for user {owner}. {} items, total {} {}",
            details.order.id,
            details.items.len(),
            details.order.total_amount,
            details.order.currency
        );
        Ok(details)
    }

    /// Fetches an order and its items. Orders the caller may not see are reported as missing.
    pub async fn fetch_order(&self, order_id: OrderId, caller: &Caller) -> Result<OrderDetails, PaymentGatewayError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| caller.can_view_order(o))
            .ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(OrderDetails { order, items })
    }

    /// Cancels a `pending` or `processing` order. Only administrators may cancel orders.
    ///
    /// Cancelling clears the paid flag but does not refund any payment.
    pub async fn cancel_order(&self, order_id: OrderId, caller: &Caller) -> Result<Order, PaymentGatewayError> {
        if !caller.is_admin {
            warn!("🔄️📦️ User {} tried to cancel order {order_id} without administrator rights", caller.user_id);
            return Err(PaymentGatewayError::Forbidden("Only administrators may cancel orders".into()));
        }
        let order = self.db.cancel_order(order_id).await?;
        info!("🔄️📦️ Order {order_id} cancelled by {}", caller.user_id);
        Ok(order)
    }
}
