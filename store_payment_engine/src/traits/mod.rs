//! # Database backend contracts
//!
//! These traits define what a storage backend must provide for the store payment engine.
//!
//! * [`PaymentGatewayDatabase`] is the write side: atomic order creation, payment recording, refunds and
//!   cancellation. Every method is a single atomic unit.
//! * [`AccountManagement`] provides read access to orders, items, payments and user accounts.
//! * [`InventoryManagement`] resolves store membership and inventory prices.
//! * [`AuthManagement`] looks up users for token issuance and performs the default admin seeding.
mod account_management;
mod auth_management;
mod inventory_management;
mod payment_gateway_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use auth_management::{AuthApiError, AuthManagement, SeedResult};
pub use inventory_management::{InventoryApiError, InventoryManagement};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
