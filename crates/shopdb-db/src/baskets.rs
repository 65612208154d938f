//! Basket operations. A basket is the caller's single order in `basket` state.

use serde::Deserialize;
use sqlx::PgPool;

use crate::orders::{load_detail, OrderDetail, OrderRow};
use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NewBasketItem {
    pub product_info: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BasketItemUpdate {
    pub id: i64,
    pub quantity: i32,
}

fn check_quantity(quantity: i32) -> Result<(), DbError> {
    if quantity < 1 {
        return Err(DbError::InvalidQuantity { quantity });
    }
    Ok(())
}

/// The user's basket with items and total, or `None` if it was never created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_basket(pool: &PgPool, user_id: i64) -> Result<Option<OrderDetail>, DbError> {
    let order = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, state, created_at, updated_at FROM orders \
         WHERE user_id = $1 AND state = 'basket'",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match order {
        Some(order) => Ok(Some(load_detail(pool, order).await?)),
        None => Ok(None),
    }
}

/// Adds offers to the user's basket, creating the basket if needed.
///
/// Adding an offer already in the basket replaces its quantity. Returns the
/// number of lines written. All items are written or none are.
///
/// # Errors
///
/// - [`DbError::InvalidQuantity`] if any quantity is below 1.
/// - [`DbError::OfferNotFound`] if an offer does not exist.
/// - [`DbError::ShopClosed`] if an offer's shop is not accepting orders.
/// - [`DbError::Sqlx`] on query failure.
pub async fn add_to_basket(
    pool: &PgPool,
    user_id: i64,
    items: &[NewBasketItem],
) -> Result<usize, DbError> {
    for item in items {
        check_quantity(item.quantity)?;
    }

    let mut tx = pool.begin().await?;

    let basket_id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, state) VALUES ($1, 'basket') \
         ON CONFLICT (user_id) WHERE state = 'basket' \
         DO UPDATE SET updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    for item in items {
        let is_open: bool = sqlx::query_scalar(
            "SELECT s.is_open FROM product_infos pi \
             JOIN shops s ON s.id = pi.shop_id \
             WHERE pi.id = $1",
        )
        .bind(item.product_info)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::OfferNotFound {
            product_info_id: item.product_info,
        })?;

        if !is_open {
            return Err(DbError::ShopClosed {
                product_info_id: item.product_info,
            });
        }

        sqlx::query(
            "INSERT INTO order_items (order_id, product_info_id, quantity) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (order_id, product_info_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(basket_id)
        .bind(item.product_info)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(items.len())
}

/// Sets quantities of lines in the user's basket. Lines that are not in the
/// caller's basket are ignored. Returns the number of lines updated.
///
/// # Errors
///
/// - [`DbError::InvalidQuantity`] if any quantity is below 1.
/// - [`DbError::Sqlx`] on query failure.
pub async fn update_basket_items(
    pool: &PgPool,
    user_id: i64,
    updates: &[BasketItemUpdate],
) -> Result<u64, DbError> {
    for update in updates {
        check_quantity(update.quantity)?;
    }

    let mut tx = pool.begin().await?;
    let mut updated = 0u64;

    for update in updates {
        updated += sqlx::query(
            "UPDATE order_items oi SET quantity = $1 \
             FROM orders o \
             WHERE oi.id = $2 AND oi.order_id = o.id \
               AND o.user_id = $3 AND o.state = 'basket'",
        )
        .bind(update.quantity)
        .bind(update.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(updated)
}

/// Removes lines from the user's basket. Returns the number of lines removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn remove_basket_items(
    pool: &PgPool,
    user_id: i64,
    item_ids: &[i64],
) -> Result<u64, DbError> {
    let removed = sqlx::query(
        "DELETE FROM order_items oi \
         USING orders o \
         WHERE oi.id = ANY($1) AND oi.order_id = o.id \
           AND o.user_id = $2 AND o.state = 'basket'",
    )
    .bind(item_ids)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(removed)
}
