//! Store Payment Engine
//!
//! The store payment engine is the transactional core of a retail back office: it turns a list of products into a
//! priced order, charges that order through a payment provider, and refunds payments. This library is
//! transport-agnostic; the HTTP surface lives in the `store_payment_server` crate.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`traits`] and [`SqliteDatabase`]). The traits define what a backend must provide. SQLite is the
//!    supported backend. You should never need to access the database directly. The exception is the data types
//!    used in the database, which are defined in [`db_types`] and are public.
//! 2. Payment providers ([`provider`]). The engine derives the amount to charge and asks a provider to collect it.
//! 3. The public API ([`OrderFlowApi`], [`PaymentFlowApi`], [`AccountApi`], [`AuthApi`], [`InventoryApi`]).
//!
//! Every API takes the authenticated [`Caller`] explicitly, and applies the visibility and role rules itself.
pub mod db_types;
pub mod provider;
#[cfg(feature = "sqlite")]
mod sqlite;
mod spe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use spe_api::{
    accounts_api::AccountApi,
    auth_api::AuthApi,
    caller::Caller,
    inventory_api::InventoryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_flow_api::PaymentFlowApi,
    payment_objects,
};
pub use traits::{
    AccountApiError,
    AccountManagement,
    AuthApiError,
    AuthManagement,
    InventoryApiError,
    InventoryManagement,
    PaymentGatewayDatabase,
    PaymentGatewayError,
    SeedResult,
};
