//! Read-only views of orders and payments, scoped to the caller.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{BillingParty, Order, Payment, PaymentId, StoreId, UserAccount, UserId},
    order_objects::OrderQueryFilter,
    payment_objects::{PaymentDetails, PaymentQueryFilter},
    spe_api::caller::Caller,
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` answers "what can this caller see?" for orders and payments.
///
/// Administrators see everything. Regular users see the orders they own, and the payments made against those orders,
/// billed to themselves, or billed to the store they work for. The scope is pushed down into the database query.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn user_account(&self, user_id: UserId) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_user_account(user_id).await
    }

    /// Orders matching `filter`, newest first. For regular users any owner in the filter is replaced by the caller.
    pub async fn orders_for(&self, caller: &Caller, filter: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError> {
        let filter = if caller.is_admin { filter } else { filter.with_owner_id(caller.user_id) };
        trace!("🔄️📦️ Searching orders for {}: {filter}", caller.user_id);
        self.db.search_orders(filter).await
    }

    /// Payments matching `filter`, newest first, each with its order's amount and items.
    pub async fn payments_for(
        &self,
        caller: &Caller,
        filter: PaymentQueryFilter,
    ) -> Result<Vec<PaymentDetails>, AccountApiError> {
        let filter = if caller.is_admin {
            PaymentQueryFilter { visible_to: None, ..filter }
        } else {
            let store_id = self.store_of(caller.user_id).await?;
            filter.visible_to(caller.user_id, store_id)
        };
        let payments = self.db.search_payments(filter).await?;
        trace!("🔄️💰️ {} payments visible to {}", payments.len(), caller.user_id);
        let mut result = Vec::with_capacity(payments.len());
        for payment in payments {
            result.push(self.expand_payment(payment).await?);
        }
        Ok(result)
    }

    /// A single payment, or `None` if it does not exist or the caller may not see it.
    pub async fn payment_for(
        &self,
        caller: &Caller,
        payment_id: PaymentId,
    ) -> Result<Option<PaymentDetails>, AccountApiError> {
        let Some(payment) = self.db.fetch_payment(payment_id).await? else {
            return Ok(None);
        };
        if !caller.is_admin {
            let store_id = self.store_of(caller.user_id).await?;
            let owns_order = match payment.order_id {
                Some(order_id) => {
                    self.db.fetch_order(order_id).await?.map(|o| caller.can_view_order(&o)).unwrap_or(false)
                },
                None => false,
            };
            let billed = payment.payer.map(|p| {
                p == BillingParty::user(caller.user_id) ||
                    store_id.map(|s| p == BillingParty::store(s)).unwrap_or(false)
            });
            if !owns_order && !billed.unwrap_or(false) {
                trace!("🔄️💰️ Payment {payment_id} is not visible to {}", caller.user_id);
                return Ok(None);
            }
        }
        self.expand_payment(payment).await.map(Some)
    }

    async fn store_of(&self, user_id: UserId) -> Result<Option<StoreId>, AccountApiError> {
        Ok(self.db.fetch_user_account(user_id).await?.and_then(|u| u.store_id))
    }

    async fn expand_payment(&self, payment: Payment) -> Result<PaymentDetails, AccountApiError> {
        let Some(order_id) = payment.order_id else {
            return Ok(PaymentDetails::new(payment, None, &[]));
        };
        let order = self.db.fetch_order(order_id).await?;
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(PaymentDetails::new(payment, order.as_ref(), &items))
    }
}
