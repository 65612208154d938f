//! Database operations for placed orders (`orders`, `order_items`).
//!
//! Totals are computed on read from item quantities and current offer
//! prices; nothing here stores a total. Every total saturates at `i64::MAX`,
//! so SQL aggregates sum in `NUMERIC` and clamp before narrowing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shopdb_core::{total_sum, BasketLine, OrderState};
use sqlx::PgPool;

use crate::{parse_state, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its aggregated total.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummaryRow {
    pub id: i64,
    pub user_id: i64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_sum: i64,
}

/// One order line joined with its offer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub product_info_id: i64,
    pub product_name: String,
    pub model: String,
    pub shop_id: i64,
    pub shop_name: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
    pub total_sum: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub user_id: i64,
    pub total_sum: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub order_id: i64,
    pub user_id: i64,
    pub from: OrderState,
    pub to: OrderState,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) async fn load_detail(pool: &PgPool, order: OrderRow) -> Result<OrderDetail, DbError> {
    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT oi.id, oi.product_info_id, p.name AS product_name, pi.model, \
                s.id AS shop_id, s.name AS shop_name, pi.price, oi.quantity \
         FROM order_items oi \
         JOIN product_infos pi ON pi.id = oi.product_info_id \
         JOIN products p ON p.id = pi.product_id \
         JOIN shops s ON s.id = pi.shop_id \
         WHERE oi.order_id = $1 \
         ORDER BY oi.id",
    )
    .bind(order.id)
    .fetch_all(pool)
    .await?;

    let lines: Vec<BasketLine> = items
        .iter()
        .map(|item| BasketLine {
            quantity: i64::from(item.quantity),
            price: item.price,
        })
        .collect();

    Ok(OrderDetail {
        total_sum: total_sum(&lines),
        order,
        items,
    })
}

// ---------------------------------------------------------------------------
// Buyer operations
// ---------------------------------------------------------------------------

/// Places the basket `order_id` owned by `user_id` (`basket → new`).
///
/// # Errors
///
/// - [`DbError::NotFound`] if the order does not exist or belongs to someone else.
/// - [`DbError::InvalidTransition`] if the order is no longer a basket.
/// - [`DbError::EmptyBasket`] if the basket has no items.
/// - [`DbError::Sqlx`] on query failure.
pub async fn place_order(pool: &PgPool, user_id: i64, order_id: i64) -> Result<PlacedOrder, DbError> {
    let mut tx = pool.begin().await?;

    let state: String =
        sqlx::query_scalar("SELECT state FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

    let from = parse_state(&state)?;
    if !from.can_transition_to(OrderState::New) {
        return Err(DbError::InvalidTransition {
            from,
            to: OrderState::New,
        });
    }

    let lines: Vec<BasketLine> = sqlx::query_as::<_, (i32, i64)>(
        "SELECT oi.quantity, pi.price \
         FROM order_items oi \
         JOIN product_infos pi ON pi.id = oi.product_info_id \
         WHERE oi.order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|(quantity, price)| BasketLine {
        quantity: i64::from(quantity),
        price,
    })
    .collect();

    if lines.is_empty() {
        return Err(DbError::EmptyBasket);
    }
    let total = total_sum(&lines);

    sqlx::query("UPDATE orders SET state = 'new', updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order_id, user_id, total_sum = total, "order placed");

    Ok(PlacedOrder {
        order_id,
        user_id,
        total_sum: total,
    })
}

/// Placed (non-basket) orders of `user_id`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool, user_id: i64) -> Result<Vec<OrderSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderSummaryRow>(
        "SELECT o.id, o.user_id, o.state, o.created_at, o.updated_at, \
                LEAST(COALESCE(SUM(oi.quantity::NUMERIC * pi.price), 0), $2)::BIGINT \
                    AS total_sum \
         FROM orders o \
         LEFT JOIN order_items oi ON oi.order_id = o.id \
         LEFT JOIN product_infos pi ON pi.id = oi.product_info_id \
         WHERE o.user_id = $1 AND o.state <> 'basket' \
         GROUP BY o.id \
         ORDER BY o.created_at DESC, o.id DESC",
    )
    .bind(user_id)
    .bind(i64::MAX)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// A placed order of `user_id` with its items, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_order(
    pool: &PgPool,
    user_id: i64,
    order_id: i64,
) -> Result<Option<OrderDetail>, DbError> {
    let order = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, state, created_at, updated_at FROM orders \
         WHERE id = $1 AND user_id = $2 AND state <> 'basket'",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match order {
        Some(order) => Ok(Some(load_detail(pool, order).await?)),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Shop operations
// ---------------------------------------------------------------------------

/// Placed orders containing offers of `shop_id`, newest first.
///
/// `total_sum` only covers the lines belonging to this shop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_partner_orders(
    pool: &PgPool,
    shop_id: i64,
) -> Result<Vec<OrderSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderSummaryRow>(
        "SELECT o.id, o.user_id, o.state, o.created_at, o.updated_at, \
                LEAST(SUM(oi.quantity::NUMERIC * pi.price), $2)::BIGINT AS total_sum \
         FROM orders o \
         JOIN order_items oi ON oi.order_id = o.id \
         JOIN product_infos pi ON pi.id = oi.product_info_id \
         WHERE pi.shop_id = $1 AND o.state <> 'basket' \
         GROUP BY o.id \
         ORDER BY o.created_at DESC, o.id DESC",
    )
    .bind(shop_id)
    .bind(i64::MAX)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Moves an order containing offers of `shop_id` to `next`.
///
/// # Errors
///
/// - [`DbError::NotFound`] if no placed order with this id contains the shop's offers.
/// - [`DbError::InvalidTransition`] if `next` is not reachable from the current state.
/// - [`DbError::Sqlx`] on query failure.
pub async fn set_order_state(
    pool: &PgPool,
    shop_id: i64,
    order_id: i64,
    next: OrderState,
) -> Result<StateChange, DbError> {
    let mut tx = pool.begin().await?;

    let (state, user_id): (String, i64) = sqlx::query_as(
        "SELECT o.state, o.user_id FROM orders o \
         WHERE o.id = $1 AND o.state <> 'basket' AND EXISTS ( \
             SELECT 1 FROM order_items oi \
             JOIN product_infos pi ON pi.id = oi.product_info_id \
             WHERE oi.order_id = o.id AND pi.shop_id = $2) \
         FOR UPDATE OF o",
    )
    .bind(order_id)
    .bind(shop_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let from = parse_state(&state)?;
    if !from.can_transition_to(next) {
        return Err(DbError::InvalidTransition { from, to: next });
    }

    sqlx::query("UPDATE orders SET state = $1, updated_at = NOW() WHERE id = $2")
        .bind(next.as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order_id, shop_id, %from, to = %next, "order state changed");

    Ok(StateChange {
        order_id,
        user_id,
        from,
        to: next,
    })
}
