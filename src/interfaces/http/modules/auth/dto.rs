//! Authentication DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{User, UserRole};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "username is required and must be at most 100 characters"))]
    pub username: String,
    #[validate(length(min = 3, max = 72, message = "password must be 3–72 characters"))]
    pub password: String,
    /// One of `student`, `dispatcher`, `admin`. Defaults to `student`.
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    role.parse::<UserRole>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("role");
        err.message = Some("role must be one of student, dispatcher, admin".into());
        err
    })
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
}
