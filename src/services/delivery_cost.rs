//! Delivery cost directory.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{DeliveryCost, DeliveryCostRequest};
use crate::store::DeliveryCostStore;
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct DeliveryCostService {
    costs: Arc<dyn DeliveryCostStore>,
}

impl DeliveryCostService {
    pub fn new(costs: Arc<dyn DeliveryCostStore>) -> Self {
        Self { costs }
    }

    pub async fn add(&self, request: &DeliveryCostRequest) -> Result<DeliveryCost> {
        let cost = DeliveryCost::create(request)?;
        self.costs.insert_delivery_cost(&cost).await?;
        Ok(cost)
    }

    pub async fn update(&self, id: Uuid, patch: &DeliveryCostRequest) -> Result<DeliveryCost> {
        let mut cost = self.get(id).await?;
        cost.apply(patch)?;
        if !self.costs.update_delivery_cost(&cost).await? {
            return Err(CommerceError::DeliveryCostNotFound);
        }
        Ok(cost)
    }

    pub async fn get(&self, id: Uuid) -> Result<DeliveryCost> {
        self.costs
            .find_delivery_cost(id)
            .await?
            .ok_or(CommerceError::DeliveryCostNotFound)
    }

    /// All entries, or those whose location contains `location` when given.
    pub async fn list(&self, location: Option<&str>) -> Result<Vec<DeliveryCost>> {
        match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => self.costs.search_delivery_costs(location).await,
            None => self.costs.list_delivery_costs().await,
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.costs.delete_delivery_cost(id).await? {
            return Err(CommerceError::DeliveryCostNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;
    use crate::store::MemoryStore;

    fn request(location: &str, cost: i64) -> DeliveryCostRequest {
        DeliveryCostRequest {
            location: Some(location.into()),
            service: None,
            cost: Some(Money::from_major(cost)),
        }
    }

    #[tokio::test]
    async fn test_search_by_location() {
        let service = DeliveryCostService::new(Arc::new(MemoryStore::new()));
        service.add(&request("Dhaka North", 60)).await.unwrap();
        service.add(&request("Chattogram", 120)).await.unwrap();
        let found = service.list(Some("dhaka")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cost, Money::from_major(60));
        assert_eq!(service.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_cost() {
        let service = DeliveryCostService::new(Arc::new(MemoryStore::new()));
        let missing = service.get(Uuid::now_v7()).await;
        assert!(matches!(missing, Err(CommerceError::DeliveryCostNotFound)));
        let no_cost = DeliveryCostRequest {
            location: Some("Sylhet".into()),
            ..Default::default()
        };
        let err = service.add(&no_cost).await.unwrap_err();
        assert!(matches!(err, CommerceError::MissingField("cost")));
    }
}
