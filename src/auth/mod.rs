//! Authentication and Authorization module
//!
//! Password hashing, bearer token issue/verify, and the middleware that
//! gates protected routes.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{JwtConfig, KeyResolver, SigningKey, StaticKey, TokenClaims, TokenError, TokenService};
pub use middleware::{auth_middleware, authenticate, AuthenticatedUser};
pub use password::{PasswordError, PasswordHash, PasswordHasher};
