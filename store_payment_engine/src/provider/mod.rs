//! # Payment providers
//!
//! The payment engine never talks to a payment backend directly. Instead it asks a [`PaymentProvider`] to charge an
//! amount it has already derived from the order, and records whatever the provider reports.
//!
//! [`SimulatedPaymentProvider`] approves every charge synchronously and is the provider used by the server.
mod simulated;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use simulated::SimulatedPaymentProvider;

use crate::db_types::{BillingParty, Money, OrderId, PaymentMethod};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment provider could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment provider rejected the request. {0}")]
    InvalidRequest(String),
}

/// What the engine asks a provider to charge. `amount` is always the order total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub method: PaymentMethod,
    pub payer: Option<BillingParty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved,
    Declined(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReceipt {
    pub transaction_id: String,
    pub outcome: ChargeOutcome,
    pub processed_at: DateTime<Utc>,
}

impl ProviderReceipt {
    pub fn is_approved(&self) -> bool {
        matches!(self.outcome, ChargeOutcome::Approved)
    }
}

#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Attempts the charge. A decline is a successful call with a `Declined` outcome; `Err` means the provider could
    /// not process the request at all.
    async fn charge(&self, request: &ChargeRequest) -> Result<ProviderReceipt, ProviderError>;

    /// Reverses an approved charge that the engine could not record.
    async fn void(&self, transaction_id: &str) -> Result<(), ProviderError> {
        log::debug!("💳️ Provider has no void support. Transaction {transaction_id} left as is");
        Ok(())
    }
}
