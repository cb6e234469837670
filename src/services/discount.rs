//! Per-product discount administration.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Discount, DiscountRequest};
use crate::store::{CatalogStore, DiscountStore};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct DiscountService {
    discounts: Arc<dyn DiscountStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl DiscountService {
    pub fn new(discounts: Arc<dyn DiscountStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { discounts, catalog }
    }

    pub async fn list(&self) -> Result<Vec<Discount>> {
        self.discounts.list_discounts().await
    }

    /// At most one discount per product.
    pub async fn add(&self, request: &DiscountRequest) -> Result<Discount> {
        let product = self.catalog.find_product(request.product_id).await?;
        if product.is_none() {
            return Err(CommerceError::ProductNotFound(request.product_id));
        }
        if self.current(request.product_id).await?.is_some() {
            return Err(CommerceError::DiscountAlreadyExists);
        }
        let discount = Discount::create(request);
        self.discounts.insert_discount(&discount).await?;
        let percentage = discount.percentage.value();
        tracing::info!(product_id = %discount.product_id, percentage, "discount added");
        Ok(discount)
    }

    /// Changes the percentage of the product's existing discount.
    pub async fn update(&self, request: &DiscountRequest) -> Result<Discount> {
        let mut discount = self
            .current(request.product_id)
            .await?
            .ok_or(CommerceError::DiscountNotFound)?;
        discount.set_percentage(request.percentage);
        if !self.discounts.update_discount(&discount).await? {
            return Err(CommerceError::DiscountNotFound);
        }
        Ok(discount)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.discounts.delete_discount(id).await? {
            return Err(CommerceError::DiscountNotFound);
        }
        Ok(())
    }

    async fn current(&self, product_id: Uuid) -> Result<Option<Discount>> {
        self.discounts.discount_for_product(product_id).await
    }
}
