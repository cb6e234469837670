//! Product and category administration.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Category, CategoryRequest, Product, ProductFilter, ProductRequest};
use crate::store::CatalogStore;
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.catalog.list_products(filter).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.catalog
            .find_product(id)
            .await?
            .ok_or(CommerceError::ProductNotFound(id))
    }

    pub async fn create_product(&self, request: &ProductRequest) -> Result<Product> {
        let product = Product::create(request)?;
        self.get_category(product.category_id).await?;
        self.catalog.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, name = %product.product_name, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, request: &ProductRequest) -> Result<Product> {
        let mut product = self.get_product(id).await?;
        product.apply(request)?;
        self.get_category(product.category_id).await?;
        if !self.catalog.update_product(&product).await? {
            return Err(CommerceError::ProductNotFound(id));
        }
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<()> {
        if !self.catalog.delete_product(id).await? {
            return Err(CommerceError::ProductNotFound(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.catalog.list_categories().await
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category> {
        self.catalog
            .find_category(id)
            .await?
            .ok_or(CommerceError::CategoryNotFound)
    }

    pub async fn create_category(&self, request: &CategoryRequest) -> Result<Category> {
        let category = Category::create(request)?;
        self.catalog.insert_category(&category).await?;
        Ok(category)
    }
}
