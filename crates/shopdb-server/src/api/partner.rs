//! Shop-account routes: price-list import, open/closed state and the
//! shop's incoming orders.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use shopdb_core::{DomainEvent, OrderState};
use shopdb_db::{ImportSummary, OrderSummaryRow, ShopRow, StateChange};
use shopdb_importer::PriceList;

use crate::middleware::{CurrentUser, RequestId};

use super::{
    map_db_error, map_import_error, require_shop, ApiError, ApiResponse, AppState,
    MISSING_ARGUMENTS,
};

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub(super) struct ImportByUrl {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SetStateRequest {
    pub state: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct SetOrderStateRequest {
    pub state: String,
}

fn shop_not_found(request_id: String) -> ApiError {
    ApiError::new(request_id, "not_found", "shop not found; import a price list first")
}

/// Body extraction failures keep axum's 413 when the upload limit trips.
fn body_rejection(request_id: &RequestId, status: StatusCode, message: String) -> ApiError {
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "validation_error"
    };
    ApiError::new(request_id.0.clone(), code, message)
}

/// `POST /api/v1/partner/update`: JSON `{"url": ...}` or a multipart `file`.
pub(super) async fn update_price_list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    req: Request,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    require_shop(&req_id.0, &user)?;

    let list = match read_price_list(&state, &req_id, req).await {
        Ok(list) => list,
        Err(err) => {
            state.events.publish(DomainEvent::ImportFailed {
                user_id: user.id,
                reason: err.errors.clone(),
            });
            return Err(err);
        }
    };

    let summary = match shopdb_db::import_price_list(&state.pool, user.id, &list).await {
        Ok(summary) => summary,
        Err(e) => {
            let err = map_db_error(req_id.0.clone(), &e);
            state.events.publish(DomainEvent::ImportFailed {
                user_id: user.id,
                reason: err.errors.clone(),
            });
            return Err(err);
        }
    };

    state.events.publish(DomainEvent::ImportCompleted {
        shop_id: summary.shop_id,
        shop_name: summary.shop_name.clone(),
        offers: summary.offers,
    });

    Ok(ApiResponse::ok(req_id.0, summary))
}

async fn read_price_list(
    state: &AppState,
    req_id: &RequestId,
    req: Request,
) -> Result<PriceList, ApiError> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| body_rejection(req_id, e.status(), e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| body_rejection(req_id, e.status(), e.body_text()))?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| body_rejection(req_id, e.status(), e.body_text()))?;
            return shopdb_importer::parse_upload(&bytes, state.config.max_upload_bytes)
                .map_err(|e| map_import_error(req_id.0.clone(), &e));
        }

        return Err(ApiError::new(
            req_id.0.clone(),
            "validation_error",
            MISSING_ARGUMENTS,
        ));
    }

    let Json(body) = Json::<ImportByUrl>::from_request(req, state)
        .await
        .map_err(|e| body_rejection(req_id, e.status(), e.body_text()))?;
    let Some(url) = body.url.filter(|u| !u.trim().is_empty()) else {
        return Err(ApiError::new(
            req_id.0.clone(),
            "validation_error",
            MISSING_ARGUMENTS,
        ));
    };

    tracing::info!(url = %url, "fetching price list");
    state
        .importer
        .fetch_price_list(url.trim())
        .await
        .map_err(|e| map_import_error(req_id.0.clone(), &e))
}

pub(super) async fn get_state(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ShopRow>>, ApiError> {
    require_shop(&req_id.0, &user)?;

    let shop = shopdb_db::get_shop_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| shop_not_found(req_id.0.clone()))?;

    Ok(ApiResponse::ok(req_id.0, shop))
}

pub(super) async fn set_state(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<SetStateRequest>,
) -> Result<Json<ApiResponse<ShopRow>>, ApiError> {
    require_shop(&req_id.0, &user)?;

    let shop = shopdb_db::set_shop_open(&state.pool, user.id, body.state)
        .await
        .map_err(|e| match e {
            shopdb_db::DbError::NotFound => shop_not_found(req_id.0.clone()),
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    tracing::info!(shop_id = shop.id, is_open = shop.is_open, "shop state changed");
    Ok(ApiResponse::ok(req_id.0, shop))
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<OrderSummaryRow>>>, ApiError> {
    require_shop(&req_id.0, &user)?;

    let shop = shopdb_db::get_shop_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| shop_not_found(req_id.0.clone()))?;

    let orders = shopdb_db::list_partner_orders(&state.pool, shop.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, orders))
}

pub(super) async fn set_order_state(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<i64>,
    Json(body): Json<SetOrderStateRequest>,
) -> Result<Json<ApiResponse<StateChange>>, ApiError> {
    require_shop(&req_id.0, &user)?;

    let next: OrderState = body
        .state
        .parse()
        .map_err(|e: shopdb_core::CoreError| {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        })?;

    let shop = shopdb_db::get_shop_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| shop_not_found(req_id.0.clone()))?;

    let change = shopdb_db::set_order_state(&state.pool, shop.id, order_id, next)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    state.events.publish(DomainEvent::OrderStateChanged {
        order_id: change.order_id,
        user_id: change.user_id,
        from: change.from,
        to: change.to,
    });

    Ok(ApiResponse::ok(req_id.0, change))
}
