//! Liveness and authenticated check handlers

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health_check() -> &'static str {
    "ok"
}

/// Answer for a request that passed the auth middleware
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    pub message: String,
    pub username: String,
}

#[utoipa::path(
    get,
    path = "/check",
    tag = "Health",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token accepted", body = CheckResponse),
        (status = 401, description = "Missing, malformed or invalid token", body = crate::interfaces::http::error::ErrorBody)
    )
)]
pub async fn check(user: AuthenticatedUser) -> Json<CheckResponse> {
    Json(CheckResponse {
        message: "you are authorised!".to_string(),
        username: user.username,
    })
}
