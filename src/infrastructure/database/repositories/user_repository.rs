use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr};
use tracing::error;
use uuid::Uuid;

use crate::auth::PasswordHash;
use crate::domain::{NewUser, StoreError, StoreResult, User, UserRole, UserStore};
use crate::infrastructure::database::entities::user;
use crate::infrastructure::database::with_timeout;

/// SeaORM-backed [`UserStore`].
pub struct SeaOrmUserStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl SeaOrmUserStore {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Student => UserRole::Student,
        user::UserRole::Dispatcher => UserRole::Dispatcher,
        user::UserRole::Admin => UserRole::Admin,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Student => user::UserRole::Student,
        UserRole::Dispatcher => user::UserRole::Dispatcher,
        UserRole::Admin => user::UserRole::Admin,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        role: entity_role_to_domain(model.role),
        password_hash: PasswordHash::from_stored(model.password_hash),
        created_at: model.created_at,
    }
}

fn db_err(e: DbErr) -> StoreError {
    error!("Database error: {}", e);
    StoreError::Persistence(format!("Database error: {}", e))
}

/// The unique index on `username` is the only uniqueness constraint an insert
/// can hit (ids are fresh v4 UUIDs).
fn insert_err(e: DbErr, username: &str) -> StoreError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::DuplicateUsername(username.to_string()),
        _ => db_err(e),
    }
}

// ── Store implementation ────────────────────────────────────────

#[async_trait]
impl UserStore for SeaOrmUserStore {
    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let username = new_user.username.clone();

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash.as_str().to_string()),
            role: Set(domain_role_to_entity(new_user.role)),
            created_at: Set(Utc::now()),
        };

        let inserted = with_timeout(self.timeout, model.insert(&self.db))
            .await?
            .map_err(|e| insert_err(e, &username))?;

        Ok(user_model_to_domain(inserted))
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<User> {
        let query = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db);

        let model = with_timeout(self.timeout, query).await?.map_err(db_err)?;

        model
            .map(user_model_to_domain)
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }
}
