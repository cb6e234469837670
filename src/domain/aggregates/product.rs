//! Product and Category Aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{contains_ignore_case, non_blank, Money, Percentage};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What the pricing calculator needs to know about a live product.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductPricing {
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub discount: Percentage,
}

impl ProductPricing {
    pub fn discounted_unit_price(&self) -> Money {
        self.discount.off(self.price)
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 255, message = "product name is required"))]
    pub product_name: String,
    pub product_code: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    #[validate(range(min = 0, max = 2147483647, message = "stock is out of range"))]
    pub stock: Option<i64>,
    pub category_id: Uuid,
}

impl ProductRequest {
    /// Stock always fits the `INTEGER` column.
    fn checked_stock(&self) -> Result<u32> {
        let stock = self.stock.unwrap_or(0);
        i32::try_from(stock)
            .ok()
            .and_then(|s| u32::try_from(s).ok())
            .ok_or_else(|| {
                CommerceError::Validation(format!("stock must be between 0 and {}", i32::MAX))
            })
    }

    fn checked_price(&self) -> Result<Money> {
        if !self.price.is_positive() {
            return Err(CommerceError::Validation("price must be greater than 0".into()));
        }
        Ok(self.price)
    }
}

impl Product {
    pub fn create(request: &ProductRequest) -> Result<Self> {
        request.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            product_name: request.product_name.trim().to_string(),
            product_code: request.product_code.clone(),
            description: request.description.clone(),
            price: request.checked_price()?,
            stock: request.checked_stock()?,
            category_id: request.category_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, request: &ProductRequest) -> Result<()> {
        request.validate()?;
        self.price = request.checked_price()?;
        self.stock = request.checked_stock()?;
        self.product_name = request.product_name.trim().to_string();
        self.product_code = request.product_code.clone();
        self.description = request.description.clone();
        self.category_id = request.category_id;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 255, message = "category name is required"))]
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn create(request: &CategoryRequest) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            id: Uuid::now_v7(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category_id != category {
                return false;
            }
        }
        match non_blank(self.search.as_deref()) {
            Some(term) => contains_ignore_case(&product.product_name, term),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn request(price: Money, stock: i64) -> ProductRequest {
        ProductRequest {
            product_name: "Oud Noir".into(),
            product_code: None,
            description: None,
            price,
            stock: Some(stock),
            category_id: Uuid::now_v7(),
        }
    }

    #[test]
    fn test_product_create() {
        let p = Product::create(&request(Money::new(Decimal::new(1999, 2)), 5)).unwrap();
        assert_eq!(p.product_name, "Oud Noir");
        assert_eq!(p.stock, 5);
    }

    #[test]
    fn test_product_rejects_bad_price_and_stock() {
        assert!(Product::create(&request(Money::ZERO, 1)).is_err());
        assert!(Product::create(&request(Money::from_major(10), -1)).is_err());
    }

    #[test]
    fn test_stock_bounded_to_integer_column() {
        let max = Product::create(&request(Money::from_major(10), i32::MAX as i64)).unwrap();
        assert_eq!(max.stock, i32::MAX as u32);
        let err = Product::create(&request(Money::from_major(10), u32::MAX as i64)).unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[test]
    fn test_discounted_unit_price() {
        let pricing = ProductPricing {
            product_id: Uuid::now_v7(),
            name: "P".into(),
            price: Money::from_major(1000),
            stock: 3,
            discount: Percentage::new(20).unwrap(),
        };
        assert_eq!(pricing.discounted_unit_price(), Money::from_major(800));
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let p = Product::create(&request(Money::from_major(10), 1)).unwrap();
        let filter = ProductFilter {
            category: None,
            search: Some("oud".into()),
        };
        assert!(filter.matches(&p));
        let other = ProductFilter {
            category: Some(Uuid::now_v7()),
            search: None,
        };
        assert!(!other.matches(&p));
    }
}
