use thiserror::Error;

use crate::db_types::{InventoryPrice, ProductId, Store, StoreId, UserId};

#[derive(Debug, Clone, Error)]
pub enum InventoryApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for InventoryApiError {
    fn from(e: sqlx::Error) -> Self {
        InventoryApiError::DatabaseError(e.to_string())
    }
}

/// Price resolution against per-store inventory. Catalog maintenance is not part of this contract.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// The store the user works for, if it exists, is active and has not been deleted.
    async fn fetch_active_store_for_user(&self, user_id: UserId) -> Result<Option<Store>, InventoryApiError>;

    /// The current unit price and stock level of a product in a store. Deleted products are never returned.
    async fn fetch_inventory_price(
        &self,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<Option<InventoryPrice>, InventoryApiError>;
}
