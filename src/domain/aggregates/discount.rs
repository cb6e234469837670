//! Per-product discount

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Percentage;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: Uuid,
    pub product_id: Uuid,
    pub percentage: Percentage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    pub product_id: Uuid,
    pub percentage: Percentage,
}

impl Discount {
    pub fn create(request: &DiscountRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            product_id: request.product_id,
            percentage: request.percentage,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_percentage(&mut self, percentage: Percentage) {
        self.percentage = percentage;
        self.updated_at = Utc::now();
    }
}
