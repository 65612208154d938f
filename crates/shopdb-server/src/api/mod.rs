mod basket;
mod catalog;
mod orders;
mod partner;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shopdb_core::{AccountType, AppConfig};
use shopdb_db::DbError;
use shopdb_importer::{ImportError, PriceListClient};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::events::EventBus;
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, CurrentUser, RateLimitState,
    RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub importer: Arc<PriceListClient>,
    pub events: EventBus,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(rename = "Status")]
    pub status: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn ok(request_id: String, data: T) -> Json<Self> {
        Json(Self {
            status: true,
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(rename = "Status")]
    pub status: bool,
    #[serde(rename = "Errors")]
    pub errors: String,
    pub code: String,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: false,
            errors: message.into(),
            code: code.into(),
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) const MISSING_ARGUMENTS: &str = "All necessary arguments are not specified";

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// Rejects callers that are not shop accounts.
pub(super) fn require_shop(request_id: &str, user: &CurrentUser) -> Result<(), ApiError> {
    if user.account_type == AccountType::Shop {
        Ok(())
    } else {
        Err(ApiError::new(request_id, "forbidden", "Only for shops"))
    }
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    let (code, message) = match error {
        DbError::NotFound => ("not_found", "record not found".to_string()),
        DbError::UnknownCategory { .. }
        | DbError::InvalidQuantity { .. }
        | DbError::EmptyBasket
        | DbError::OfferNotFound { .. } => ("validation_error", error.to_string()),
        DbError::ShopOwnedByOther { .. }
        | DbError::AccountHasShop { .. }
        | DbError::ShopClosed { .. }
        | DbError::InvalidTransition { .. } => ("conflict", error.to_string()),
        _ if error.is_unique_violation() => {
            tracing::warn!(error = %error, "unique constraint violated");
            ("conflict", "record conflicts with existing data".to_string())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ("internal_error", "database query failed".to_string())
        }
    };
    ApiError::new(request_id, code, message)
}

pub(super) fn map_import_error(request_id: String, error: &ImportError) -> ApiError {
    let code = match error {
        ImportError::InvalidUrl { .. }
        | ImportError::Encoding
        | ImportError::Yaml(_)
        | ImportError::Validation(_) => "validation_error",
        ImportError::TooLarge { .. } => "payload_too_large",
        ImportError::Http(_) | ImportError::UnexpectedStatus { .. } => {
            tracing::warn!(error = %error, "price list fetch failed");
            "bad_gateway"
        }
    };
    ApiError::new(request_id, code, error.to_string())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(
    auth: AuthState,
    rate_limit: RateLimitState,
    max_upload_bytes: usize,
) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/partner/update",
            post(partner::update_price_list).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/api/v1/partner/state",
            get(partner::get_state).post(partner::set_state),
        )
        .route("/api/v1/partner/orders", get(partner::list_orders))
        .route(
            "/api/v1/partner/orders/{order_id}",
            patch(partner::set_order_state),
        )
        .route(
            "/api/v1/basket",
            get(basket::get_basket)
                .post(basket::add_items)
                .put(basket::update_items)
                .delete(basket::remove_items),
        )
        .route(
            "/api/v1/orders",
            get(orders::list_orders).post(orders::place_order),
        )
        .route("/api/v1/orders/{order_id}", get(orders::get_order))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/shops", get(catalog::list_shops))
        .route("/api/v1/categories", get(catalog::list_categories))
        .route("/api/v1/products", get(catalog::list_products))
        .route("/api/v1/products/{offer_id}", get(catalog::get_product));

    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit, max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match shopdb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            ApiResponse::ok(
                req_id.0,
                HealthData {
                    status: "ok",
                    database: "ok",
                },
            ),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::ok(
                    req_id.0,
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                ),
            )
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use shopdb_core::OrderState;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("forbidden", StatusCode::FORBIDDEN),
            ("conflict", StatusCode::CONFLICT),
            ("payload_too_large", StatusCode::PAYLOAD_TOO_LARGE),
            ("bad_gateway", StatusCode::BAD_GATEWAY),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[test]
    fn api_error_serializes_failure_envelope() {
        let err = ApiError::new("req-1", "forbidden", "Only for shops");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["Status"], false);
        assert_eq!(json["Errors"], "Only for shops");
        assert_eq!(json["code"], "forbidden");
        assert_eq!(json["meta"]["request_id"], "req-1");
    }

    #[test]
    fn require_shop_rejects_buyers() {
        let buyer = CurrentUser {
            id: 1,
            email: "buyer@example.com".to_string(),
            account_type: AccountType::Buyer,
        };
        let err = require_shop("req-1", &buyer).unwrap_err();
        assert_eq!(err.code, "forbidden");

        let shop = CurrentUser {
            account_type: AccountType::Shop,
            ..buyer
        };
        assert!(require_shop("req-1", &shop).is_ok());
    }

    #[test]
    fn domain_db_errors_surface_their_message() {
        let err = map_db_error(
            "req-1".to_string(),
            &DbError::InvalidTransition {
                from: OrderState::Sent,
                to: OrderState::New,
            },
        );
        assert_eq!(err.code, "conflict");
        assert_eq!(err.errors, "order cannot move from 'sent' to 'new'");

        let err = map_db_error("req-1".to_string(), &DbError::CorruptRow("x".to_string()));
        assert_eq!(err.code, "internal_error");
        assert_eq!(err.errors, "database query failed");
    }

    #[test]
    fn validation_failures_keep_the_supplier_message() {
        let err = shopdb_importer::parse_price_list("categories: []\ngoods: []\n").unwrap_err();
        let api = map_import_error("req-1".to_string(), &err);
        assert_eq!(api.code, "validation_error");
        assert_eq!(api.errors, "Field \"shop\" not found.");
    }
}
