//! In-memory user store

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{NewUser, StoreError, StoreResult, User, UserStore};

/// In-memory store for development and testing.
///
/// Uniqueness holds under concurrency because the check and the insert
/// happen under the same shard lock.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        match self.users.entry(new_user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername(new_user.username)),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    username: new_user.username,
                    role: new_user.role,
                    password_hash: new_user.password_hash,
                    created_at: Utc::now(),
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        self.users
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }
}
