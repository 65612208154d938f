use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

// Path relative to crates/shopdb-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &shopdb_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("shop \"{shop}\" belongs to another account")]
    ShopOwnedByOther { shop: String },
    #[error("account already owns shop \"{existing}\"")]
    AccountHasShop { existing: String },
    #[error("category {category} of product #{position} does not exist")]
    UnknownCategory { category: i64, position: usize },
    #[error("offer {product_info_id} does not exist")]
    OfferNotFound { product_info_id: i64 },
    #[error("shop of offer {product_info_id} is not accepting orders")]
    ShopClosed { product_info_id: i64 },
    #[error("quantity must be at least 1, got {quantity}")]
    InvalidQuantity { quantity: i32 },
    #[error("basket is empty")]
    EmptyBasket,
    #[error("order cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        from: shopdb_core::OrderState,
        to: shopdb_core::OrderState,
    },
    #[error("stored value is invalid: {0}")]
    CorruptRow(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// True when the error is a Postgres unique-constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlx(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505")
        )
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table may not exist yet on a fresh database;
    // treat absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

pub(crate) fn parse_state(raw: &str) -> Result<shopdb_core::OrderState, DbError> {
    raw.parse()
        .map_err(|e: shopdb_core::CoreError| DbError::CorruptRow(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_state_rejects_unknown_values() {
        assert!(matches!(parse_state("lost"), Err(DbError::CorruptRow(_))));
        assert_eq!(
            parse_state("basket").expect("valid"),
            shopdb_core::OrderState::Basket
        );
    }
}

pub mod baskets;
pub mod catalog;
pub mod import;
pub mod orders;
pub mod partners;
pub mod users;

pub use baskets::{
    add_to_basket, get_basket, remove_basket_items, update_basket_items,
    BasketItemUpdate, NewBasketItem,
};
pub use catalog::{
    get_offer, list_categories, list_offers, list_open_shops, CategoryRow, OfferDetail,
    OfferFilter, OfferParameter, OfferRow, ShopRow,
};
pub use import::{import_price_list, ImportSummary};
pub use orders::{
    get_order, list_orders, list_partner_orders, place_order, set_order_state, OrderDetail,
    OrderItemRow, OrderRow, OrderSummaryRow, PlacedOrder, StateChange,
};
pub use partners::{get_shop_for_user, set_shop_open};
pub use users::{
    create_user, generate_token, get_user_by_email, get_user_by_token, hash_token, UserRow,
};
