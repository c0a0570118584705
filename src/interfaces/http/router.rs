//! API Router with Swagger UI

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::error::ErrorBody;
use super::modules::{auth, health};
use crate::auth::auth_middleware;
use crate::domain::UserRole;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::handlers::health_check,
        health::handlers::check,
        auth::handlers::register,
        auth::handlers::login,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserInfo,
            health::CheckResponse,
            UserRole,
            ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "Health", description = "Liveness and token check")
    )
)]
pub struct ApiDoc;

/// Build the application router.
///
/// `/check` sits behind the bearer-token middleware; registration, login
/// and the docs are open.
pub fn create_router(state: auth::AuthHandlerState) -> Router {
    let protected = Router::new()
        .route("/check", get(health::check))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(health::health_check))
        .route("/auth/users", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use chrono::Duration;
    use secrecy::SecretString;
    use serde_json::{json, Value};

    use super::*;
    use crate::auth::{JwtConfig, PasswordHasher, StaticKey, TokenService};
    use crate::infrastructure::InMemoryUserStore;

    const SECRET: &str = "router-test-secret";

    fn tokens() -> Arc<TokenService> {
        let config = JwtConfig::new(SecretString::from(SECRET.to_string()));
        Arc::new(TokenService::new(&config).unwrap())
    }

    fn app() -> Router {
        create_router(auth::AuthHandlerState::new(
            Arc::new(InMemoryUserStore::new()),
            tokens(),
            PasswordHasher::new(4),
        ))
    }

    async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
        use tower::Service;
        let mut svc = app.clone().into_service();
        svc.call(req).await.unwrap()
    }

    async fn read_json(resp: Response<Body>) -> (StatusCode, Value) {
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get_check(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/check");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register(app: &Router, body: Value) -> (StatusCode, Value) {
        read_json(send(app, post_json("/auth/users", body)).await).await
    }

    async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
        send(
            app,
            post_json("/auth/login", json!({"username": username, "password": password})),
        )
        .await
    }

    // ── Registration ───────────────────────────────────────────

    #[tokio::test]
    async fn register_returns_user_and_token() {
        let app = app();

        let (status, body) = register(
            &app,
            json!({"username": "alice", "password": "s3cret", "role": "dispatcher"}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "dispatcher");
        assert!(body["user"]["id"].is_string());
        assert!(body["user"]["created_at"].is_string());
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("password_hash").is_none());

        let claims = tokens().verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn register_enforces_password_length() {
        let app = app();
        let cases = [
            (2, StatusCode::BAD_REQUEST),
            (3, StatusCode::CREATED),
            (72, StatusCode::CREATED),
            (73, StatusCode::BAD_REQUEST),
        ];

        for (len, expected) in cases {
            let (status, _) = register(
                &app,
                json!({"username": format!("user{len}"), "password": "x".repeat(len)}),
            )
            .await;
            assert_eq!(status, expected, "password length {len}");
        }
    }

    #[tokio::test]
    async fn register_rejects_unknown_role() {
        let app = app();

        let (status, body) = register(
            &app,
            json!({"username": "mallory", "password": "password", "role": "superuser"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_failed");
    }

    #[tokio::test]
    async fn register_defaults_role_to_student() {
        let app = app();

        let (status, body) = register(&app, json!({"username": "sam", "password": "password"})).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["role"], "student");
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let app = app();

        let (status, body) = register(&app, json!({"username": "nopass"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_failed");

        let (status, _) = register(&app, json!({"username": "", "password": "password"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let app = app();
        let payload = json!({"username": "alice", "password": "password"});

        let (first, _) = register(&app, payload.clone()).await;
        let (second, body) = register(&app, payload).await;

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate_username");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_registration_admits_exactly_one() {
        let app = app();
        let payload = json!({"username": "racer", "password": "password"});

        let (a, b) = tokio::join!(register(&app, payload.clone()), register(&app, payload.clone()));

        let mut statuses = [a.0.as_u16(), b.0.as_u16()];
        statuses.sort_unstable();
        assert_eq!(statuses, [201, 409]);
    }

    // ── Login ──────────────────────────────────────────────────

    #[tokio::test]
    async fn login_returns_user_and_token() {
        let app = app();
        register(&app, json!({"username": "alice", "password": "password", "role": "admin"})).await;

        let (status, body) = read_json(login(&app, "alice", "password").await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(tokens().verify(body["token"].as_str().unwrap()).unwrap().sub, "alice");
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_identical() {
        let app = app();
        register(&app, json!({"username": "alice", "password": "password"})).await;

        let unknown = login(&app, "nobody", "password").await;
        let wrong = login(&app, "alice", "not-the-password").await;

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let unknown_body = axum::body::to_bytes(unknown.into_body(), usize::MAX).await.unwrap();
        let wrong_body = axum::body::to_bytes(wrong.into_body(), usize::MAX).await.unwrap();
        assert_eq!(unknown_body, wrong_body);

        let body: Value = serde_json::from_slice(&unknown_body).unwrap();
        assert_eq!(body["code"], "invalid_credentials");
    }

    #[tokio::test]
    async fn login_with_suffix_after_72_bytes_is_rejected() {
        let app = app();
        let password = "p".repeat(72);
        let (status, _) = register(&app, json!({"username": "alice", "password": password})).await;
        assert_eq!(status, StatusCode::CREATED);

        let extended = format!("{}-and-more", password);
        let (status, body) = read_json(login(&app, "alice", &extended).await).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "invalid_credentials");
        assert_eq!(body["error"], "invalid credentials");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let app = app();

        let (status, _) = read_json(login(&app, "", "password").await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = read_json(login(&app, "alice", "").await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ── Protected routes ───────────────────────────────────────

    #[tokio::test]
    async fn protected_route_without_header_is_401() {
        let (status, body) = read_json(send(&app(), get_check(None)).await).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "missing_header");
    }

    #[tokio::test]
    async fn protected_route_with_basic_auth_is_401() {
        let (status, body) = read_json(send(&app(), get_check(Some("Basic abc"))).await).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "bad_format");
    }

    #[tokio::test]
    async fn protected_route_with_bad_token_is_401() {
        let foreign = TokenService::with_resolver(
            StaticKey::new(&SecretString::from("other-secret".to_string())).unwrap(),
            Duration::hours(1),
            JwtConfig::DEFAULT_ISSUER,
        )
        .issue("alice")
        .unwrap();
        let expired = TokenService::with_resolver(
            StaticKey::new(&SecretString::from(SECRET.to_string())).unwrap(),
            Duration::seconds(-60),
            JwtConfig::DEFAULT_ISSUER,
        )
        .issue("alice")
        .unwrap();

        let app = app();
        for token in ["garbage", foreign.as_str(), expired.as_str()] {
            let header = format!("Bearer {token}");
            let (status, body) = read_json(send(&app, get_check(Some(&header))).await).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], "invalid_token");
            assert_eq!(body["error"], "invalid or expired token");
        }
    }

    #[tokio::test]
    async fn protected_route_binds_identity_from_fresh_token() {
        let app = app();
        let (_, registered) = register(&app, json!({"username": "alice", "password": "password"})).await;
        let header = format!("Bearer {}", registered["token"].as_str().unwrap());

        let (status, body) = read_json(send(&app, get_check(Some(&header))).await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["message"], "you are authorised!");
    }

    // ── Open routes ────────────────────────────────────────────

    #[tokio::test]
    async fn root_is_open() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = send(&app(), req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn openapi_document_lists_auth_routes() {
        let req = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();

        let (status, doc) = read_json(send(&app(), req).await).await;

        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/auth/users"]["post"].is_object());
        assert!(doc["paths"]["/auth/login"]["post"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
