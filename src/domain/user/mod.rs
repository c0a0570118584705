//! User aggregate
//!
//! Contains the User entity and the store interface.

pub mod model;
pub mod repository;

pub use model::{NewUser, UnknownRole, User, UserRole};
pub use repository::UserStore;
