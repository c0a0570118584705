//! HTTP REST API interfaces
//!
//! - `modules`: register / login handlers and the protected check route
//! - `error`: mapping of every failure to a status and error body
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod error;
pub mod modules;
pub mod router;

pub use error::{ApiError, ErrorBody, Unauthorized};
pub use modules::auth::AuthHandlerState;
pub use router::create_router;
