//! # Campus Auth
//!
//! Credential and session service: user registration, login, and bearer
//! token gating of protected routes.
//!
//! ## Architecture
//!
//! - **auth**: bcrypt password hashing, JWT issue/verify, bearer middleware
//! - **domain**: user entity, roles, and the `UserStore` port
//! - **infrastructure**: SeaORM-backed and in-memory user stores, migrations
//! - **interfaces**: REST API with Swagger documentation
//! - **config**: TOML configuration with environment overrides

pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use config::{default_config_path, AppConfig, ConfigError};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryUserStore, SeaOrmUserStore};

// Re-export API router
pub use interfaces::http::{create_router, AuthHandlerState};
