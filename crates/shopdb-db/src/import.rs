//! Catalog import: writes a validated price list into the normalized catalog.
//!
//! Categories, products and parameters are upserted and reused across
//! imports. A shop's offers (`product_infos`) are deleted and recreated on
//! every import. The whole sequence runs in one transaction, and the shop
//! row stays locked until commit, so concurrent imports of the same shop
//! run one after the other and a failure leaves the previous offers intact.

use std::collections::{HashMap, HashSet};

use shopdb_importer::{GoodEntry, PriceList};
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

/// Counts describing what an import wrote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    pub shop_id: i64,
    pub shop_name: String,
    pub categories: usize,
    pub offers: usize,
    pub parameters: usize,
    /// Offers of the previous import that were removed.
    pub replaced: u64,
}

/// Imports `list` on behalf of the shop account `owner_id`.
///
/// # Errors
///
/// - [`DbError::ShopOwnedByOther`] if the named shop belongs to another account.
/// - [`DbError::AccountHasShop`] if the account already owns a differently named shop.
/// - [`DbError::UnknownCategory`] if a good references a category that is neither
///   in the document nor already stored.
/// - [`DbError::Sqlx`] for any database failure, including a duplicate
///   `(product, external id)` pair within the document.
///
/// Every error rolls back the whole import.
pub async fn import_price_list(
    pool: &PgPool,
    owner_id: i64,
    list: &PriceList,
) -> Result<ImportSummary, DbError> {
    let mut tx = pool.begin().await?;

    let shop_id = resolve_shop(&mut tx, owner_id, &list.shop).await?;

    for category in &list.categories {
        sqlx::query(
            "INSERT INTO categories (id, name) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name \
             WHERE categories.name IS DISTINCT FROM EXCLUDED.name",
        )
        .bind(category.id)
        .bind(&category.name)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shop_categories (shop_id, category_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(shop_id)
        .bind(category.id)
        .execute(&mut *tx)
        .await?;
    }

    check_good_categories(&mut tx, list).await?;

    let replaced = sqlx::query("DELETE FROM product_infos WHERE shop_id = $1")
        .bind(shop_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut parameter_ids: HashMap<&str, i64> = HashMap::new();
    let mut parameters = 0usize;

    for good in &list.goods {
        let product_info_id = insert_offer(&mut tx, shop_id, good).await?;

        for param in &good.parameters {
            let parameter_id = match parameter_ids.get(param.name.as_str()) {
                Some(id) => *id,
                None => {
                    let id = upsert_parameter(&mut tx, &param.name).await?;
                    parameter_ids.insert(param.name.as_str(), id);
                    id
                }
            };

            sqlx::query(
                "INSERT INTO product_parameters (product_info_id, parameter_id, value) \
                 VALUES ($1, $2, $3)",
            )
            .bind(product_info_id)
            .bind(parameter_id)
            .bind(&param.value)
            .execute(&mut *tx)
            .await?;
            parameters += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        shop_id,
        shop = %list.shop,
        categories = list.categories.len(),
        offers = list.goods.len(),
        replaced,
        "price list imported"
    );

    Ok(ImportSummary {
        shop_id,
        shop_name: list.shop.clone(),
        categories: list.categories.len(),
        offers: list.goods.len(),
        parameters,
        replaced,
    })
}

/// Gets or creates the shop by name, tags it with `owner_id`, and locks its row.
async fn resolve_shop(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: i64,
    name: &str,
) -> Result<i64, DbError> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT name FROM shops WHERE user_id = $1")
            .bind(owner_id)
            .fetch_optional(&mut **tx)
            .await?;
    if let Some(existing) = existing {
        if existing != name {
            return Err(DbError::AccountHasShop { existing });
        }
    }

    // DO UPDATE (rather than DO NOTHING) returns the row and holds its lock
    // until the transaction ends.
    let (shop_id, shop_owner): (i64, Option<i64>) = sqlx::query_as(
        "INSERT INTO shops (name, user_id) VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET \
             user_id = COALESCE(shops.user_id, EXCLUDED.user_id), \
             updated_at = NOW() \
         RETURNING id, user_id",
    )
    .bind(name)
    .bind(owner_id)
    .fetch_one(&mut **tx)
    .await?;

    if shop_owner != Some(owner_id) {
        return Err(DbError::ShopOwnedByOther {
            shop: name.to_owned(),
        });
    }

    Ok(shop_id)
}

/// Every good must point at a category that exists once the document's own
/// categories have been written.
async fn check_good_categories(
    tx: &mut Transaction<'_, Postgres>,
    list: &PriceList,
) -> Result<(), DbError> {
    let declared: HashSet<i64> = list.categories.iter().map(|c| c.id).collect();
    let undeclared: Vec<i64> = list
        .goods
        .iter()
        .map(|g| g.category)
        .filter(|id| !declared.contains(id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if undeclared.is_empty() {
        return Ok(());
    }

    let stored: HashSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE id = ANY($1)")
            .bind(&undeclared)
            .fetch_all(&mut **tx)
            .await?
            .into_iter()
            .collect();

    if let Some((idx, good)) = list
        .goods
        .iter()
        .enumerate()
        .find(|(_, g)| !declared.contains(&g.category) && !stored.contains(&g.category))
    {
        return Err(DbError::UnknownCategory {
            category: good.category,
            position: idx + 1,
        });
    }

    Ok(())
}

async fn insert_offer(
    tx: &mut Transaction<'_, Postgres>,
    shop_id: i64,
    good: &GoodEntry,
) -> Result<i64, DbError> {
    let product_id: i64 = sqlx::query_scalar(
        "INSERT INTO products (name, category_id) VALUES ($1, $2) \
         ON CONFLICT (name, category_id) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(&good.name)
    .bind(good.category)
    .fetch_one(&mut **tx)
    .await?;

    let product_info_id: i64 = sqlx::query_scalar(
        "INSERT INTO product_infos \
             (product_id, shop_id, external_id, model, quantity, price, price_rrc) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(product_id)
    .bind(shop_id)
    .bind(good.id)
    .bind(&good.model)
    .bind(good.quantity)
    .bind(good.price)
    .bind(good.price_rrc)
    .fetch_one(&mut **tx)
    .await?;

    Ok(product_info_id)
}

async fn upsert_parameter(tx: &mut Transaction<'_, Postgres>, name: &str) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO parameters (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}
