use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use spg_common::Money;
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::traits::PaymentGatewayError;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

/// Defines an integer primary-key newtype. The id serializes as a bare integer and displays as `#<id>`.
macro_rules! db_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().trim_start_matches('#');
                s.parse::<i64>()
                    .map(Self)
                    .map_err(|e| ConversionError(format!("Invalid {}: {s}. {e}", stringify!($name))))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

db_id!(
    /// Server-assigned order identifier
    OrderId
);
db_id!(PaymentId);
db_id!(OrderItemId);
db_id!(ProductId);
db_id!(StoreId);
db_id!(UserId);

/// Implements `Display`, `FromStr` and a lenient `From<String>` for a unit-only enum stored as lowercase text.
macro_rules! text_enum {
    ($name:ident, $default:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ConversionError(format!("Invalid {}: {other}", stringify!($name)))),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!("Invalid {}: {value}. This conversion cannot fail, so defaulting to {}", stringify!($name), Self::$default);
                    Self::$default
                })
            }
        }
    };
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Newly created and unpaid
    #[default]
    Pending,
    /// Paid, awaiting fulfilment
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

text_enum!(OrderStatusType, Pending, {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl OrderStatusType {
    /// Orders in these states accept a charge or a cancellation.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_id: Option<UserId>,
    /// The store whose inventory priced this order
    pub store_id: Option<StoreId>,
    pub status: OrderStatusType,
    pub total_amount: Money,
    pub currency: String,
    pub shipping_address: Option<String>,
    pub is_paid: bool,
    pub metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// One requested line of a new order. Prices are never part of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub owner_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub shipping_address: Option<String>,
    pub currency: String,
    pub metadata: serde_json::Value,
}

impl NewOrder {
    pub fn new(owner_id: UserId, items: Vec<NewOrderItem>) -> Self {
        Self {
            owner_id,
            items,
            shipping_address: None,
            currency: spg_common::DEFAULT_CURRENCY_CODE.to_string(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_shipping_address<S: Into<String>>(mut self, address: S) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = spg_common::normalize_currency_code(&currency.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Checks the shape of the request before anything is priced or stored.
    pub fn validate(&self) -> Result<(), PaymentGatewayError> {
        if self.items.is_empty() {
            return Err(PaymentGatewayError::EmptyOrder);
        }
        match self.items.iter().find(|i| i.quantity < 1) {
            Some(item) => Err(PaymentGatewayError::InvalidQuantity { product_id: item.product_id, quantity: item.quantity }),
            None => Ok(()),
        }
    }
}

/// A line that has been priced from store inventory. The line total can only be produced by [`PricedOrderItem::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    line_total: Money,
}

impl PricedOrderItem {
    /// Returns `None` if the line total overflows.
    pub fn new(product_id: ProductId, price: &InventoryPrice, quantity: i64) -> Option<Self> {
        let line_total = price.unit_price.checked_mul(quantity)?;
        Some(Self {
            product_id,
            product_name: price.product_name.clone(),
            sku: price.sku.clone(),
            quantity,
            unit_price: price.unit_price,
            line_total,
        })
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }
}

//-----------------------------------------   PaymentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Refunded,
}

text_enum!(PaymentStatus, Pending, {
    Pending => "pending",
    Success => "success",
    Failed => "failed",
    Refunded => "refunded",
});

//-----------------------------------------   PaymentMethod   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    BankTransfer,
    Cash,
    Wallet,
    Other,
}

text_enum!(PaymentMethod, Card, {
    Card => "card",
    BankTransfer => "bank_transfer",
    Cash => "cash",
    Wallet => "wallet",
    Other => "other",
});

//-----------------------------------------   BillingParty    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingPartyKind {
    User,
    Store,
}

text_enum!(BillingPartyKind, User, {
    User => "user",
    Store => "store",
});

/// Who is billed for a payment: either a user or a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingParty {
    pub kind: BillingPartyKind,
    pub id: i64,
}

impl BillingParty {
    pub fn user(id: UserId) -> Self {
        Self { kind: BillingPartyKind::User, id: id.value() }
    }

    pub fn store(id: StoreId) -> Self {
        Self { kind: BillingPartyKind::Store, id: id.value() }
    }
}

impl Display for BillingParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
/// A single charge attempt. Payments carry no amount: the charged amount is the linked order's total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: Option<OrderId>,
    pub payer: Option<BillingParty>,
    pub currency: String,
    pub method: PaymentMethod,
    pub provider_transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub processed_at: Option<DateTime<Utc>>,
    /// The amount requested when this payment was refunded. Audit only.
    pub refund_amount: Option<Money>,
    pub metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub payer: Option<BillingParty>,
    pub currency: String,
    pub method: PaymentMethod,
    pub provider_transaction_id: String,
    pub status: PaymentStatus,
    pub processed_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

text_enum!(Role, User, {
    User => "user",
    Admin => "admin",
});

pub type Roles = Vec<Role>;

//--------------------------------------      UserAccount      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub store_id: Option<StoreId>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn roles(&self) -> Roles {
        if self.is_admin {
            vec![Role::User, Role::Admin]
        } else {
            vec![Role::User]
        }
    }
}

//--------------------------------------        Store          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub code: String,
    pub status: StoreStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    InventoryPrice     ---------------------------------------------------------
/// The current price and stock level of a product in one store's inventory.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct InventoryPrice {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity_available: i64,
}
