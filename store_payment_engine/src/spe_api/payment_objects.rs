use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{Money, Order, OrderId, OrderItem, OrderItemId, Payment, PaymentMethod, PaymentStatus, StoreId, UserId},
    traits::{AccountApiError, PaymentGatewayError},
};

/// Optional parameters of a charge. There is no amount: the charge is always the order total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeParams {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Bill this store instead of the caller
    #[serde(default)]
    pub store_id: Option<StoreId>,
}

impl ChargeParams {
    /// Parses a raw request body. A `null` body means "all defaults".
    pub fn from_payload(payload: Value) -> Result<Self, PaymentGatewayError> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        parse_charge_payload(payload)
    }
}

/// A payment creation request naming the order to charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCreateRequest {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub params: ChargeParams,
}

impl PaymentCreateRequest {
    pub fn from_payload(payload: Value) -> Result<Self, PaymentGatewayError> {
        parse_charge_payload(payload)
    }
}

/// Any charge body that mentions `amount` is refused before its other fields are looked at.
fn parse_charge_payload<T: DeserializeOwned>(payload: Value) -> Result<T, PaymentGatewayError> {
    match &payload {
        Value::Object(map) if map.contains_key("amount") => return Err(PaymentGatewayError::ClientSuppliedAmount),
        Value::Object(_) => {},
        _ => return Err(PaymentGatewayError::InvalidRequest("The request body must be a JSON object".into())),
    }
    serde_json::from_value(payload).map_err(|e| PaymentGatewayError::InvalidRequest(e.to_string()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    #[serde(default)]
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentItemView {
    pub id: OrderItemId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl From<&OrderItem> for PaymentItemView {
    fn from(item: &OrderItem) -> Self {
        Self { id: item.id, name: item.product_name.clone(), unit_price: item.unit_price, quantity: item.quantity }
    }
}

/// A payment as presented to callers: the stored record plus the amount and items of its order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDetails {
    #[serde(flatten)]
    pub payment: Payment,
    /// The linked order's total. `None` if the payment has no order.
    pub amount: Option<Money>,
    pub items: Vec<PaymentItemView>,
}

impl PaymentDetails {
    pub fn new(payment: Payment, order: Option<&Order>, items: &[OrderItem]) -> Self {
        let amount = order.map(|o| o.total_amount);
        let items = items.iter().map(PaymentItemView::from).collect();
        Self { payment, amount, items }
    }
}

/// Restricts a payment search to what a regular user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentScope {
    pub user_id: UserId,
    /// The store the user works for, if any
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentQueryFilter {
    pub order_id: Option<OrderId>,
    pub status: Option<Vec<PaymentStatus>>,
    pub method: Option<PaymentMethod>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub visible_to: Option<PaymentScope>,
}

impl PaymentQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, AccountApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| AccountApiError::QueryError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, AccountApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| AccountApiError::QueryError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn visible_to(mut self, user_id: UserId, store_id: Option<StoreId>) -> Self {
        self.visible_to = Some(PaymentScope { user_id, store_id });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.method.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.visible_to.is_none()
    }
}
