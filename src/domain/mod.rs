//! Domain layer - user records and the store contract

pub mod error;
pub mod user;

pub use error::{StoreError, StoreResult};
pub use user::{NewUser, UnknownRole, User, UserRole, UserStore};
