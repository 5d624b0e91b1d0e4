use async_trait::async_trait;
use crate::errors::StoreResult;
use crate::models::{ProvisionedService, User};

/// Persistence the panel needs for accounts and their relay services.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_user_id(&self, username: &str) -> StoreResult<Option<String>>;

    /// Returns `false` when the username is already taken.
    async fn create_user(&self, user: &User) -> StoreResult<bool>;

    async fn list_used_ports(&self) -> StoreResult<Vec<u16>>;

    /// Records `service` on the user and marks them active, but only if the
    /// user exists and has no service yet. Returns the number of rows updated.
    async fn assign_service(&self, id: &str, service: &ProvisionedService) -> StoreResult<u64>;
}
