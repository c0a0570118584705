use async_trait::async_trait;

use super::{NewUser, User};
use crate::domain::StoreResult;

/// Persistence of user records, keyed by username.
///
/// Implementations enforce username uniqueness themselves and report a clash
/// as [`StoreError::DuplicateUsername`](crate::domain::StoreError). Every call
/// is bounded in time; an operation that overruns fails with
/// [`StoreError::Persistence`](crate::domain::StoreError).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user, assigning its id and creation time.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn get_by_username(&self, username: &str) -> StoreResult<User>;
}
