use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::PasswordHash;

/// User role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Dispatcher,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Student, UserRole::Dispatcher, UserRole::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Dispatcher => "dispatcher",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A persisted user.
///
/// `password_hash` is needed to check logins and must never be put in a
/// response.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub password_hash: PasswordHash,
    pub created_at: DateTime<Utc>,
}

/// A user about to be created. The store assigns `id` and `created_at`.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub role: UserRole,
    pub password_hash: PasswordHash,
}
