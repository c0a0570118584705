//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value. Both a body
//! that does not parse and a body that fails validation are answered with
//! 400 `validation_failed`.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::interfaces::http::error::ApiError;

/// An extractor that deserializes JSON and validates it.
///
/// # Usage
///
/// ```ignore
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Login {
///     #[validate(length(min = 1))]
///     username: String,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<Login>) {
///     // `body` is guaranteed to pass validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(format!("invalid request body: {}", rejection.body_text())))?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// Flatten field errors into `field: message; field: message`, sorted by field.
fn describe(errors: &ValidationErrors) -> String {
    let mut field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    field_errors.sort();

    if field_errors.is_empty() {
        "invalid input".to_string()
    } else {
        field_errors.join("; ")
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct TestBody {
        #[validate(length(min = 1, max = 10))]
        name: String,
        #[validate(range(min = 1, max = 100))]
        age: u32,
    }

    async fn handler(ValidatedJson(_body): ValidatedJson<TestBody>) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new().route("/test", post(handler))
    }

    async fn send(req: Request<Body>) -> axum::http::Response<Body> {
        use tower::Service;
        let mut svc = app().into_service();
        svc.call(req).await.unwrap()
    }

    fn json_request(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/test")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_returns_ok() {
        let body = serde_json::json!({"name": "Alice", "age": 30});
        let resp = send(json_request(serde_json::to_vec(&body).unwrap())).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_json_returns_400() {
        let resp = send(json_request("not json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validation_failure_returns_400() {
        let body = serde_json::json!({"name": "", "age": 0});
        let resp = send(json_request(serde_json::to_vec(&body).unwrap())).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "validation_failed");
        assert!(body["error"].as_str().unwrap().contains("name"));
        assert!(body["error"].as_str().unwrap().contains("age"));
    }
}
