//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use super::dto::{AuthResponse, LoginRequest, RegisterRequest, UserInfo};
use crate::auth::{PasswordError, PasswordHash, PasswordHasher, TokenService};
use crate::domain::{NewUser, StoreError, UserRole, UserStore};
use crate::interfaces::http::common::ValidatedJson;
use crate::interfaces::http::error::{ApiError, ErrorBody, Unauthorized};

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenService>,
    pub hasher: PasswordHasher,
}

impl AuthHandlerState {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>, hasher: PasswordHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }
}

/// bcrypt is CPU-bound; keep it off the async workers.
async fn run_blocking<T, F>(context: &'static str, task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::internal(context, e))
}

async fn hash_off_thread(hasher: PasswordHasher, password: String) -> Result<PasswordHash, ApiError> {
    run_blocking("Password hashing task failed", move || hasher.hash(&password))
        .await?
        .map_err(ApiError::from)
}

async fn verify_off_thread(
    hash: PasswordHash,
    candidate: String,
) -> Result<Result<(), PasswordError>, ApiError> {
    run_blocking("Password verification task failed", move || hash.verify(&candidate)).await
}

#[utoipa::path(
    post,
    path = "/auth/users",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Username already exists", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let role = match request.role.as_deref() {
        Some(raw) => raw
            .parse::<UserRole>()
            .map_err(|e| ApiError::Validation(e.to_string()))?,
        None => UserRole::default(),
    };

    let password_hash = hash_off_thread(state.hasher, request.password).await?;

    let user = state
        .users
        .create(NewUser {
            username: request.username,
            role,
            password_hash,
        })
        .await
        .map_err(|e| {
            if let StoreError::DuplicateUsername(ref username) = e {
                warn!("Registration rejected: username '{}' is taken", username);
            }
            ApiError::from(e)
        })?;

    let token = state.tokens.issue(&user.username)?;

    info!("Registered user '{}' with role {}", user.username, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserInfo::from(user),
            token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    // Unknown username and wrong password must produce the same response.
    let user = match state.users.get_by_username(&request.username).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            warn!("Login rejected for '{}': unknown username", request.username);
            return Err(Unauthorized::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = verify_off_thread(user.password_hash.clone(), request.password).await? {
        warn!("Login rejected for '{}': {}", request.username, e);
        return Err(Unauthorized::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user.username)?;

    info!("Successful login for '{}'", user.username);

    Ok(Json(AuthResponse {
        user: UserInfo::from(user),
        token,
    }))
}
