//! Read-side catalog queries: shops, categories and offers.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShopRow {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

/// One shop's offer of a product, joined with product, category and shop names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub external_id: i64,
    pub model: String,
    pub product_id: i64,
    pub product_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub shop_id: i64,
    pub shop_name: String,
    pub quantity: i32,
    pub price: i64,
    pub price_rrc: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferDetail {
    #[serde(flatten)]
    pub offer: OfferRow,
    /// Ordered by parameter name.
    pub parameters: Vec<OfferParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfferFilter {
    pub shop_id: Option<i64>,
    pub category_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

const OFFER_SELECT: &str = "SELECT pi.id, pi.external_id, pi.model, \
            p.id AS product_id, p.name AS product_name, \
            c.id AS category_id, c.name AS category_name, \
            s.id AS shop_id, s.name AS shop_name, \
            pi.quantity, pi.price, pi.price_rrc \
     FROM product_infos pi \
     JOIN products p ON p.id = pi.product_id \
     JOIN categories c ON c.id = p.category_id \
     JOIN shops s ON s.id = pi.shop_id";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Shops currently accepting orders, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_open_shops(pool: &PgPool) -> Result<Vec<ShopRow>, DbError> {
    let rows = sqlx::query_as::<_, ShopRow>(
        "SELECT id, name, url, is_open FROM shops WHERE is_open = true ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All categories, optionally only those offered by `shop_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(
    pool: &PgPool,
    shop_id: Option<i64>,
) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name FROM categories c \
         WHERE $1::BIGINT IS NULL OR EXISTS ( \
             SELECT 1 FROM shop_categories sc \
             WHERE sc.category_id = c.id AND sc.shop_id = $1) \
         ORDER BY c.name, c.id",
    )
    .bind(shop_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Offers from open shops matching `filter`, with their parameters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_offers(pool: &PgPool, filter: OfferFilter) -> Result<Vec<OfferDetail>, DbError> {
    let sql = format!(
        "{OFFER_SELECT} \
         WHERE s.is_open = true \
           AND ($1::BIGINT IS NULL OR s.id = $1) \
           AND ($2::BIGINT IS NULL OR c.id = $2) \
         ORDER BY p.name, pi.id \
         LIMIT $3 OFFSET $4"
    );
    let offers = sqlx::query_as::<_, OfferRow>(&sql)
        .bind(filter.shop_id)
        .bind(filter.category_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    attach_parameters(pool, offers).await
}

/// A single offer by id regardless of shop state, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_offer(pool: &PgPool, product_info_id: i64) -> Result<Option<OfferDetail>, DbError> {
    let sql = format!("{OFFER_SELECT} WHERE pi.id = $1");
    let offer = sqlx::query_as::<_, OfferRow>(&sql)
        .bind(product_info_id)
        .fetch_optional(pool)
        .await?;

    match offer {
        Some(offer) => Ok(attach_parameters(pool, vec![offer]).await?.pop()),
        None => Ok(None),
    }
}

async fn attach_parameters(
    pool: &PgPool,
    offers: Vec<OfferRow>,
) -> Result<Vec<OfferDetail>, DbError> {
    if offers.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = offers.iter().map(|o| o.id).collect();
    let rows = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT pp.product_info_id, p.name, pp.value \
         FROM product_parameters pp \
         JOIN parameters p ON p.id = pp.parameter_id \
         WHERE pp.product_info_id = ANY($1) \
         ORDER BY pp.product_info_id, p.name",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_offer: HashMap<i64, Vec<OfferParameter>> = HashMap::new();
    for (offer_id, name, value) in rows {
        by_offer
            .entry(offer_id)
            .or_default()
            .push(OfferParameter { name, value });
    }

    Ok(offers
        .into_iter()
        .map(|offer| OfferDetail {
            parameters: by_offer.remove(&offer.id).unwrap_or_default(),
            offer,
        })
        .collect())
}
