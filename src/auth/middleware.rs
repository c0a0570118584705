//! Authentication middleware for Axum
//!
//! A protected request moves through four steps: extract the
//! `Authorization` header, parse the `Bearer <token>` value, verify the
//! token, and bind the authenticated identity to the request. Every failure
//! is terminal and answers 401.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::jwt::TokenService;
use crate::interfaces::http::error::{ApiError, Unauthorized};

const BEARER_SCHEME: &str = "Bearer";

/// Identity bound to a request after its token has been verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Run the extract / parse / verify steps against a request's headers.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthenticatedUser, Unauthorized> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(Unauthorized::MissingHeader)?;

    let token = extract_token(auth_header).ok_or(Unauthorized::BadFormat)?;

    let claims = tokens.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        Unauthorized::InvalidToken
    })?;

    Ok(AuthenticatedUser {
        username: claims.sub,
    })
}

/// Split `Scheme Token`; only the bearer scheme is accepted.
fn extract_token(auth_header: &str) -> Option<&str> {
    let mut parts = auth_header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) => Some(token),
        _ => None,
    }
}

/// JWT authentication middleware - requires a valid token
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(request.headers(), &tokens)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized(Unauthorized::MissingHeader))
    }
}
