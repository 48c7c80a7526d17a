//! The `UserClient` trait — the collaborator's capability boundary.

use async_trait::async_trait;

use crate::models::{NewUser, User};
use crate::ClientError;

/// Capability-typed client for the user-record service.
///
/// The client is stateless and safely shared across all operations; step
/// handlers receive it as `&dyn UserClient`.
#[async_trait]
pub trait UserClient: Send + Sync {
    /// List user records, one bounded page at a time.
    async fn list_users(&self, page: u32, limit: u32) -> Result<Vec<User>, ClientError>;

    /// Create a single user record.
    async fn create_user(&self, user: &NewUser) -> Result<User, ClientError>;

    /// Delete a user record by id.
    ///
    /// Returns [`ClientError::NotFound`] when the record is already gone.
    async fn delete_user(&self, id: &str) -> Result<(), ClientError>;
}
