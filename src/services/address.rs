//! Address book: one live address per user.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Address, AddressRequest};
use crate::store::{AddressStore, UserDirectory};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct AddressService {
    addresses: Arc<dyn AddressStore>,
    users: Arc<dyn UserDirectory>,
}

impl AddressService {
    pub fn new(addresses: Arc<dyn AddressStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { addresses, users }
    }

    pub async fn add(&self, user_id: Uuid, request: &AddressRequest) -> Result<Address> {
        if !self.users.user_exists(user_id).await? {
            return Err(CommerceError::UserNotFound);
        }
        let address = Address::create(user_id, request)?;
        self.addresses.insert_address(&address).await?;
        tracing::info!(address_id = %address.id, user_id = %user_id, "address added");
        Ok(address)
    }

    /// Only the owner may update; anyone else gets not-found.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &AddressRequest,
    ) -> Result<Address> {
        let mut address = self
            .addresses
            .find_address(id, user_id)
            .await?
            .ok_or(CommerceError::AddressNotFound)?;
        address.apply(patch)?;
        if !self.addresses.update_address(&address).await? {
            return Err(CommerceError::AddressNotFound);
        }
        tracing::info!(address_id = %id, user_id = %user_id, "address updated");
        Ok(address)
    }

    pub async fn get_for_user(&self, user_id: Uuid) -> Result<Address> {
        self.addresses
            .address_for_user(user_id)
            .await?
            .ok_or(CommerceError::AddressNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn request() -> AddressRequest {
        AddressRequest {
            full_name: Some("Nadia Rahman".into()),
            phone_number: Some("01711000000".into()),
            address: Some("House 7, Road 3".into()),
            is_default: Some(true),
        }
    }

    async fn service() -> (AddressService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::now_v7();
        store.register_user(user).await.unwrap();
        (AddressService::new(store.clone(), store), user)
    }

    #[tokio::test]
    async fn test_one_address_per_user() {
        let (service, user) = service().await;
        let address = service.add(user, &request()).await.unwrap();
        assert_eq!(service.get_for_user(user).await.unwrap().id, address.id);
        let err = service.add(user, &request()).await.unwrap_err();
        assert!(matches!(err, CommerceError::AddressAlreadyExists));
    }

    #[tokio::test]
    async fn test_update_is_owner_only() {
        let (service, user) = service().await;
        let address = service.add(user, &request()).await.unwrap();
        let patch = AddressRequest {
            address: Some("Flat 2B, Banani".into()),
            ..Default::default()
        };
        let err = service
            .update(address.id, Uuid::now_v7(), &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound));
        let updated = service.update(address.id, user, &patch).await.unwrap();
        assert_eq!(updated.address, "Flat 2B, Banani");
        assert_eq!(updated.full_name, "Nadia Rahman");
    }

    #[tokio::test]
    async fn test_unknown_user_and_missing_address() {
        let (service, _) = service().await;
        let stranger = Uuid::now_v7();
        let err = service.add(stranger, &request()).await.unwrap_err();
        assert!(matches!(err, CommerceError::UserNotFound));
        let err = service.get_for_user(stranger).await.unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotFound));
    }
}
