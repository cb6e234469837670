//! Flat delivery fee per location/service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{contains_ignore_case, non_blank, Money};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCost {
    pub id: Uuid,
    pub location: String,
    pub service: Option<String>,
    pub cost: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCostRequest {
    #[validate(length(min = 1, max = 255, message = "location is required"))]
    pub location: Option<String>,
    pub service: Option<String>,
    pub cost: Option<Money>,
}

impl DeliveryCost {
    pub fn create(request: &DeliveryCostRequest) -> Result<Self> {
        request.validate()?;
        let location = non_blank(request.location.as_deref())
            .ok_or(CommerceError::MissingField("location"))?;
        let cost = checked_cost(request.cost.ok_or(CommerceError::MissingField("cost"))?)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            location: location.to_string(),
            service: request.service.clone(),
            cost,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, patch: &DeliveryCostRequest) -> Result<()> {
        patch.validate()?;
        if let Some(location) = non_blank(patch.location.as_deref()) {
            self.location = location.to_string();
        }
        if let Some(service) = patch.service.as_deref().filter(|s| !s.is_empty()) {
            self.service = Some(service.to_string());
        }
        if let Some(cost) = patch.cost {
            self.cost = checked_cost(cost)?;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn location_matches(&self, term: &str) -> bool {
        contains_ignore_case(&self.location, term)
    }
}

fn checked_cost(cost: Money) -> Result<Money> {
    if cost.is_negative() {
        return Err(CommerceError::Validation("cost cannot be negative".into()));
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_cost_create_and_patch() {
        let mut cost = DeliveryCost::create(&DeliveryCostRequest {
            location: Some("Dhaka".into()),
            service: None,
            cost: Some(Money::from_major(60)),
        })
        .unwrap();
        assert!(cost.location_matches("DHA"));
        cost.apply(&DeliveryCostRequest {
            cost: Some(Money::from_major(80)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cost.cost, Money::from_major(80));
        assert_eq!(cost.location, "Dhaka");
    }

    #[test]
    fn test_delivery_cost_requires_cost() {
        let err = DeliveryCost::create(&DeliveryCostRequest {
            location: Some("Dhaka".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CommerceError::MissingField("cost")));
    }
}
