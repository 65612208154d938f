use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use shopdb_db::{BasketItemUpdate, NewBasketItem, OrderDetail, OrderItemRow};

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, MISSING_ARGUMENTS};

#[derive(Debug, Deserialize)]
pub(super) struct AddItemsRequest {
    #[serde(default)]
    pub items: Vec<NewBasketItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateItemsRequest {
    #[serde(default)]
    pub items: Vec<BasketItemUpdate>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveItemsRequest {
    #[serde(default)]
    pub items: Vec<i64>,
}

/// The caller's basket. A caller without a basket sees an empty one.
#[derive(Debug, Serialize)]
pub(super) struct BasketView {
    pub id: Option<i64>,
    pub items: Vec<OrderItemRow>,
    pub total_sum: i64,
}

impl From<Option<OrderDetail>> for BasketView {
    fn from(detail: Option<OrderDetail>) -> Self {
        match detail {
            Some(detail) => Self {
                id: Some(detail.order.id),
                items: detail.items,
                total_sum: detail.total_sum,
            },
            None => Self {
                id: None,
                items: Vec::new(),
                total_sum: 0,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct Affected {
    pub count: u64,
}

fn require_items<T>(request_id: &str, items: &[T]) -> Result<(), ApiError> {
    if items.is_empty() {
        Err(ApiError::new(
            request_id,
            "validation_error",
            MISSING_ARGUMENTS,
        ))
    } else {
        Ok(())
    }
}

pub(super) async fn get_basket(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<BasketView>>, ApiError> {
    let basket = shopdb_db::get_basket(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, BasketView::from(basket)))
}

pub(super) async fn add_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<AddItemsRequest>,
) -> Result<Json<ApiResponse<Affected>>, ApiError> {
    require_items(&req_id.0, &body.items)?;

    let written = shopdb_db::add_to_basket(&state.pool, user.id, &body.items)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::debug!(user_id = user.id, written, "basket items added");
    Ok(ApiResponse::ok(
        req_id.0,
        Affected {
            count: u64::try_from(written).unwrap_or(u64::MAX),
        },
    ))
}

pub(super) async fn update_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateItemsRequest>,
) -> Result<Json<ApiResponse<Affected>>, ApiError> {
    require_items(&req_id.0, &body.items)?;

    let count = shopdb_db::update_basket_items(&state.pool, user.id, &body.items)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, Affected { count }))
}

pub(super) async fn remove_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<RemoveItemsRequest>,
) -> Result<Json<ApiResponse<Affected>>, ApiError> {
    require_items(&req_id.0, &body.items)?;

    let count = shopdb_db::remove_basket_items(&state.pool, user.id, &body.items)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, Affected { count }))
}
