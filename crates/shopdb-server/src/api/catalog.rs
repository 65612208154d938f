//! Public catalog reads: shops, categories and offers of open shops.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use shopdb_db::{CategoryRow, OfferDetail, OfferFilter, ShopRow};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CategoryQuery {
    pub shop_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub shop_id: Option<i64>,
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub(super) async fn list_shops(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ShopRow>>>, ApiError> {
    let shops = shopdb_db::list_open_shops(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, shops))
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryRow>>>, ApiError> {
    let categories = shopdb_db::list_categories(&state.pool, query.shop_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, categories))
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<OfferDetail>>>, ApiError> {
    let filter = OfferFilter {
        shop_id: query.shop_id,
        category_id: query.category_id,
        limit: normalize_limit(query.limit),
        offset: query.offset.unwrap_or(0).max(0),
    };
    let offers = shopdb_db::list_offers(&state.pool, filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::ok(req_id.0, offers))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(offer_id): Path<i64>,
) -> Result<Json<ApiResponse<OfferDetail>>, ApiError> {
    let offer = shopdb_db::get_offer(&state.pool, offer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "product not found"))?;
    Ok(ApiResponse::ok(req_id.0, offer))
}
