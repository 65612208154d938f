//! Shop-account operations on the account's own shop.

use sqlx::PgPool;

use crate::catalog::ShopRow;
use crate::DbError;

/// The shop owned by `user_id`, or `None` if the account has not imported yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_shop_for_user(pool: &PgPool, user_id: i64) -> Result<Option<ShopRow>, DbError> {
    let row = sqlx::query_as::<_, ShopRow>(
        "SELECT id, name, url, is_open FROM shops WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Opens or closes the shop owned by `user_id` for new orders.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the account owns no shop, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_shop_open(pool: &PgPool, user_id: i64, is_open: bool) -> Result<ShopRow, DbError> {
    sqlx::query_as::<_, ShopRow>(
        "UPDATE shops SET is_open = $1, updated_at = NOW() \
         WHERE user_id = $2 \
         RETURNING id, name, url, is_open",
    )
    .bind(is_open)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
