use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use shopdb_core::DomainEvent;
use shopdb_db::{OrderDetail, OrderSummaryRow, PlacedOrder};

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PlaceOrderRequest {
    pub id: i64,
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<OrderSummaryRow>>>, ApiError> {
    let orders = shopdb_db::list_orders(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, orders))
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>, ApiError> {
    let order = shopdb_db::get_order(&state.pool, user.id, order_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "order not found"))?;
    Ok(ApiResponse::ok(req_id.0, order))
}

/// `POST /api/v1/orders`: places the caller's basket `{"id": basket_id}`.
pub(super) async fn place_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<Json<ApiResponse<PlacedOrder>>, ApiError> {
    let placed = shopdb_db::place_order(&state.pool, user.id, body.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    state.events.publish(DomainEvent::OrderPlaced {
        order_id: placed.order_id,
        user_id: placed.user_id,
        total_sum: placed.total_sum,
    });

    Ok(ApiResponse::ok(req_id.0, placed))
}
