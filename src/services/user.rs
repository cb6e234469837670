//! Local user directory, fed by the auth gateway's vouched ids.

use std::sync::Arc;
use uuid::Uuid;

use crate::store::UserDirectory;
use crate::Result;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserDirectory>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Makes sure an authenticated caller has a local row, so ownership
    /// checks and foreign keys hold on their first request.
    pub async fn register(&self, user_id: Uuid) -> Result<()> {
        self.users.register_user(user_id).await.inspect_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "user registration failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone());
        let user = Uuid::now_v7();
        assert!(!store.user_exists(user).await.unwrap());
        service.register(user).await.unwrap();
        service.register(user).await.unwrap();
        assert!(store.user_exists(user).await.unwrap());
    }
}
