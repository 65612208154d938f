use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shopdb_core::AccountType;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated caller, stored as a request extension by
/// [`require_bearer_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub account_type: AccountType,
}

/// Token lookup settings used by the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pool: PgPool,
    token_salt: Arc<str>,
}

impl AuthState {
    #[must_use]
    pub fn new(pool: PgPool, token_salt: &str) -> Self {
        Self {
            pool,
            token_salt: Arc::from(token_salt),
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    #[serde(rename = "Status")]
    status: bool,
    #[serde(rename = "Errors")]
    errors: &'static str,
    code: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            status: false,
            errors: message,
            code,
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the bearer token to a user and inserting
/// [`CurrentUser`] into request extensions.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(req.headers().get(AUTHORIZATION)) else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Log in required",
        );
    };

    let user = match shopdb_db::get_user_by_token(&auth.pool, &auth.token_salt, token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return reject(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Log in required",
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "token lookup failed");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "database query failed",
            );
        }
    };

    let account_type = match user.account_type() {
        Ok(account_type) => account_type,
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "stored account type is invalid");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "database query failed",
            );
        }
    };

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        account_type,
    });

    next.run(req).await
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn extract_bearer_token_rejects_blank_token() {
        let header = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(None), None);
    }

    #[test]
    fn middleware_error_uses_failure_envelope() {
        let body = MiddlewareErrorBody {
            status: false,
            errors: "Log in required",
            code: "unauthorized",
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["Status"], false);
        assert_eq!(json["Errors"], "Log in required");
    }
}
