use log::trace;

use crate::{
    db_types::{InventoryPrice, ProductId, Store, StoreId, UserId},
    traits::{InventoryApiError, InventoryManagement},
};

/// Price and store lookups against per-store inventory.
#[derive(Debug)]
pub struct InventoryApi<B> {
    db: B,
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn price_for(
        &self,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<Option<InventoryPrice>, InventoryApiError> {
        let price = self.db.fetch_inventory_price(store_id, product_id).await?;
        trace!("🗃️ Price lookup for product {product_id} in store {store_id}: {price:?}");
        Ok(price)
    }

    pub async fn active_store_for_user(&self, user_id: UserId) -> Result<Option<Store>, InventoryApiError> {
        self.db.fetch_active_store_for_user(user_id).await
    }
}
