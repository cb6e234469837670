//! Per-user cart.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{AddToCartRequest, CartItem};
use crate::domain::value_objects::Quantity;
use crate::store::{CartStore, CatalogStore};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { carts, catalog }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
        self.carts.cart_for_user(user_id).await
    }

    /// Adding a product already in the cart grows the existing line.
    pub async fn add(&self, user_id: Uuid, request: &AddToCartRequest) -> Result<CartItem> {
        let quantity = Quantity::new(request.quantity)?;
        let product = self.catalog.find_product(request.product_id).await?;
        if product.is_none() {
            return Err(CommerceError::ProductNotFound(request.product_id));
        }
        self.carts
            .add_to_cart(user_id, request.product_id, quantity)
            .await
    }

    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        if !self.carts.remove_cart_line(user_id, id).await? {
            return Err(CommerceError::CartItemsNotFound);
        }
        Ok(())
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<()> {
        self.carts.clear_cart(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn request(product_id: Uuid, quantity: i64) -> AddToCartRequest {
        AddToCartRequest {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let store = Arc::new(MemoryStore::new());
        let service = CartService::new(store.clone(), store);
        let user = Uuid::now_v7();

        let zero = service.add(user, &request(Uuid::now_v7(), 0)).await;
        assert!(matches!(zero, Err(CommerceError::Validation(_))));

        let unknown = service.add(user, &request(Uuid::now_v7(), 1)).await;
        assert!(matches!(unknown, Err(CommerceError::ProductNotFound(_))));

        let removed = service.remove(user, Uuid::now_v7()).await;
        assert!(matches!(removed, Err(CommerceError::CartItemsNotFound)));
    }
}
