//! # Store payment engine public API
//!
//! The `spe_api` module exposes the programmatic API for the store payment engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] creates, fetches and cancels orders.
//! * [`payment_flow_api`] charges orders through a [`crate::provider::PaymentProvider`] and refunds payments.
//! * [`accounts_api`] lists orders and payments, scoped to what the caller may see.
//! * [`auth_api`] looks up users and roles, and seeds the default administrator.
//! * [`inventory_api`] resolves store membership and inventory prices.
//!
//! # API usage
//!
//! Every API is created by supplying a database backend that implements the backend traits it needs:
//!
//! ```rust,ignore
//! use store_payment_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/store.db", 5).await?;
//! let api = OrderFlowApi::new(db);
//! let order = api.fetch_order(OrderId(1), &Caller::admin(UserId(1))).await?;
//! ```
pub mod accounts_api;
pub mod auth_api;
pub mod caller;
pub mod inventory_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_flow_api;
pub mod payment_objects;
