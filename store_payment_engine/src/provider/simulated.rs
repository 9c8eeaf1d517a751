use chrono::Utc;
use log::*;

use super::{ChargeOutcome, ChargeRequest, PaymentProvider, ProviderError, ProviderReceipt};

/// A provider that approves every charge immediately.
///
/// Transaction ids have the form `SIM-<unix millis>-<payer>-<order id>`, where the payer is `anon` for payments with
/// no billing party. They are unique enough for audit, but no uniqueness is enforced.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedPaymentProvider;

impl SimulatedPaymentProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PaymentProvider for SimulatedPaymentProvider {
    async fn charge(&self, request: &ChargeRequest) -> Result<ProviderReceipt, ProviderError> {
        let processed_at = Utc::now();
        let payer = request.payer.map(|p| p.to_string()).unwrap_or_else(|| "anon".to_string());
        let transaction_id = format!("SIM-{}-{payer}-{}", processed_at.timestamp_millis(), request.order_id.value());
        debug!(
            "💳️ Simulated charge of {} {} for order {} approved as {transaction_id}",
            request.amount, request.currency, request.order_id
        );
        Ok(ProviderReceipt { transaction_id, outcome: ChargeOutcome::Approved, processed_at })
    }

    async fn void(&self, transaction_id: &str) -> Result<(), ProviderError> {
        info!("💳️ Simulated transaction {transaction_id} voided");
        Ok(())
    }
}
