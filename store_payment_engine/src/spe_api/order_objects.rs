use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::normalize_currency_code;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType, StoreId, UserId},
    traits::AccountApiError,
};

/// An order together with its items, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// The body of an order creation request. The owner always comes from the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewOrderRequest {
    pub fn into_new_order(self, owner_id: UserId, default_currency: &str) -> NewOrder {
        let currency = self
            .currency
            .map(|c| normalize_currency_code(&c))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_currency.to_string());
        let mut order = NewOrder::new(owner_id, self.items).with_currency(currency);
        if let Some(address) = self.shipping_address {
            order = order.with_shipping_address(address);
        }
        if let Some(metadata) = self.metadata {
            order = order.with_metadata(metadata);
        }
        order
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub owner_id: Option<UserId>,
    pub store_id: Option<StoreId>,
    pub currency: Option<String>,
    pub is_paid: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
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

    pub fn with_owner_id(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_store_id(mut self, store_id: StoreId) -> Self {
        self.store_id = Some(store_id);
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(normalize_currency_code(&currency.into()));
        self
    }

    pub fn with_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none() &&
            self.store_id.is_none() &&
            self.currency.is_none() &&
            self.is_paid.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(owner_id) = &self.owner_id {
            write!(f, "owner_id: {owner_id}. ")?;
        }
        if let Some(store_id) = &self.store_id {
            write!(f, "store_id: {store_id}. ")?;
        }
        if let Some(currency) = &self.currency {
            write!(f, "currency: {currency}. ")?;
        }
        if let Some(is_paid) = &self.is_paid {
            write!(f, "is_paid: {is_paid}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}
