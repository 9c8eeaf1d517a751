use std::fmt::Debug;

use log::*;
use serde_json::Value;
use spg_common::normalize_currency_code;

use crate::{
    db_types::{BillingParty, Money, NewPayment, OrderId, PaymentId, PaymentStatus, StoreId},
    payment_objects::{ChargeParams, PaymentDetails},
    provider::{ChargeOutcome, ChargeRequest, PaymentProvider, SimulatedPaymentProvider},
    spe_api::caller::Caller,
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

/// `PaymentFlowApi` charges orders through a [`PaymentProvider`] and refunds successful payments.
///
/// The amount charged is always the order's stored total. Callers can never supply one.
pub struct PaymentFlowApi<B, P = SimulatedPaymentProvider> {
    db: B,
    provider: P,
}

impl<B, P> Debug for PaymentFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B, P> PaymentFlowApi<B, P> {
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> PaymentFlowApi<B, P>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    /// Charges the total of `order_id` on behalf of `caller`.
    ///
    /// Checks, in order: the order exists and is visible to the caller; it is not yet paid; it is `pending` or
    /// `processing`; its total is positive; a requested currency, if any, is the order's currency. The billing party
    /// is the caller unless `params.store_id` names a store, which the caller must be an administrator or a member
    /// of.
    ///
    /// An approved charge is recorded as `success` and marks the order paid in the same transaction. A declined
    /// charge is recorded as `failed` and leaves the order alone. If an approved charge cannot be recorded (usually
    /// because a concurrent charge won), the provider is asked to void it.
    pub async fn charge(
        &self,
        order_id: OrderId,
        caller: &Caller,
        params: ChargeParams,
    ) -> Result<PaymentDetails, PaymentGatewayError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| caller.can_view_order(o))
            .ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        if order.is_paid {
            return Err(PaymentGatewayError::AlreadyPaid(order_id));
        }
        if !order.status.is_open() {
            return Err(PaymentGatewayError::OrderNotPayable(order_id, order.status));
        }
        let amount = order.total_amount;
        if !amount.is_positive() {
            return Err(PaymentGatewayError::NonPositiveAmount(amount));
        }
        let payer = self.billing_party(caller, params.store_id).await?;
        let currency = match params.currency.map(|c| normalize_currency_code(&c)).filter(|c| !c.is_empty()) {
            Some(requested) if requested != order.currency => {
                return Err(PaymentGatewayError::CurrencyMismatch { order_id, requested, expected: order.currency });
            },
            _ => order.currency.clone(),
        };
        let method = params.method.unwrap_or_default();
        let request = ChargeRequest { order_id, amount, currency: currency.clone(), method, payer: Some(payer) };
        trace!("🔄️💰️ Requesting a charge of {amount} {currency} for order {order_id} billed to {payer}");
        let receipt = self.provider.charge(&request).await?;

        let mut metadata = params.metadata.unwrap_or_else(|| Value::Object(Default::default()));
        let status = match &receipt.outcome {
            ChargeOutcome::Approved => PaymentStatus::Success,
            ChargeOutcome::Declined(reason) => {
                info!("🔄️💰️ Charge for order {order_id} declined. {reason}");
                if let Some(map) = metadata.as_object_mut() {
                    map.insert("decline_reason".into(), Value::String(reason.clone()));
                }
                PaymentStatus::Failed
            },
        };
        let new_payment = NewPayment {
            order_id,
            payer: Some(payer),
            currency,
            method,
            provider_transaction_id: receipt.transaction_id.clone(),
            status,
            processed_at: receipt.processed_at,
            metadata,
        };
        let payment = match self.db.record_payment(new_payment).await {
            Ok(p) => p,
            Err(e) => {
                if receipt.is_approved() {
                    warn!("🔄️💰️ Approved charge {} could not be recorded. {e}. Voiding it.", receipt.transaction_id);
                    if let Err(void_err) = self.provider.void(&receipt.transaction_id).await {
                        error!("🔄️💰️ Could not void transaction {}. {void_err}", receipt.transaction_id);
                    }
                }
                return Err(e);
            },
        };
        info!("🔄️💰️ Payment {} for order {order_id} recorded as {}", payment.id, payment.status);
        let order = self.db.fetch_order(order_id).await?;
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(PaymentDetails::new(payment, order.as_ref(), &items))
    }

    /// Refunds a successful payment. Only administrators may issue refunds.
    ///
    /// `amount` defaults to the order total and must be positive and no larger than it. Any accepted amount reverts the
    /// whole order to unpaid; the amount itself is kept on the payment for audit.
    pub async fn refund(
        &self,
        payment_id: PaymentId,
        caller: &Caller,
        amount: Option<Money>,
    ) -> Result<PaymentDetails, PaymentGatewayError> {
        if !caller.is_admin {
            warn!("🔄️💰️ User {} tried to refund payment {payment_id} without administrator rights", caller.user_id);
            return Err(PaymentGatewayError::Forbidden("Only administrators may issue refunds".into()));
        }
        let payment =
            self.db.fetch_payment(payment_id).await?.ok_or(PaymentGatewayError::PaymentNotFound(payment_id))?;
        if payment.status != PaymentStatus::Success {
            return Err(PaymentGatewayError::NotRefundable(payment_id, payment.status));
        }
        let order_id = payment.order_id.ok_or(PaymentGatewayError::NoLinkedOrder(payment_id))?;
        let original =
            self.db.fetch_order(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?.total_amount;
        let amount = amount.unwrap_or(original);
        if !amount.is_positive() || amount > original {
            return Err(PaymentGatewayError::InvalidRefundAmount { requested: amount, original });
        }
        let (payment, order) = self.db.refund_payment(payment_id, amount).await?;
        info!("🔄️💰️ Payment {payment_id} refunded ({amount} of {original}). Order {order_id} is {}", order.status);
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(PaymentDetails::new(payment, Some(&order), &items))
    }

    async fn billing_party(
        &self,
        caller: &Caller,
        store_id: Option<StoreId>,
    ) -> Result<BillingParty, PaymentGatewayError> {
        let Some(store_id) = store_id else {
            return Ok(BillingParty::user(caller.user_id));
        };
        if caller.is_admin {
            return Ok(BillingParty::store(store_id));
        }
        let member = self.db.fetch_user_account(caller.user_id).await?.and_then(|u| u.store_id) == Some(store_id);
        if member {
            Ok(BillingParty::store(store_id))
        } else {
            Err(PaymentGatewayError::Forbidden(format!("User {} may not bill store {store_id}", caller.user_id)))
        }
    }
}
