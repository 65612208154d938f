//! `import` command: loads a price list from disk or over HTTP and writes it
//! into the catalog on behalf of a shop account.

use std::path::PathBuf;

use anyhow::Context;
use shopdb_core::{AccountType, AppConfig};
use shopdb_importer::{PriceList, PriceListClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    pub(crate) fn from_args(file: Option<PathBuf>, url: Option<String>) -> anyhow::Result<Self> {
        match (file, url) {
            (Some(path), None) => Ok(Source::File(path)),
            (None, Some(url)) => Ok(Source::Url(url)),
            _ => anyhow::bail!("exactly one of --file or --url is required"),
        }
    }
}

/// Read and validate a price list without touching the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the URL cannot be fetched,
/// or the document fails validation.
pub(crate) async fn load_price_list(config: &AppConfig, source: &Source) -> anyhow::Result<PriceList> {
    match source {
        Source::File(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(shopdb_importer::parse_upload(&bytes, config.max_upload_bytes)?)
        }
        Source::Url(url) => {
            let client = PriceListClient::new(
                config.fetch_timeout_secs,
                &config.fetch_user_agent,
                config.max_upload_bytes,
            )
            .context("failed to build price-list client")?;
            Ok(client.fetch_price_list(url).await?)
        }
    }
}

pub(crate) async fn run_dry_run(config: &AppConfig, source: &Source) -> anyhow::Result<()> {
    let list = load_price_list(config, source).await?;
    println!(
        "dry-run: shop \"{}\" with {} categories, {} goods, {} parameters is valid",
        list.shop,
        list.categories.len(),
        list.goods.len(),
        list.parameter_count()
    );
    Ok(())
}

/// Import a price list for the shop account `owner_email`.
///
/// # Errors
///
/// Returns an error if the owner does not exist or is not a shop account,
/// the price list cannot be loaded, or the import fails. A failed import
/// leaves the shop's previous offers in place.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    owner_email: &str,
    source: &Source,
) -> anyhow::Result<()> {
    let owner = shopdb_db::get_user_by_email(pool, owner_email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user '{owner_email}' not found"))?;
    if owner.account_type()? != AccountType::Shop {
        anyhow::bail!("user '{owner_email}' is not a shop account");
    }

    let list = load_price_list(config, source).await?;
    let summary = shopdb_db::import_price_list(pool, owner.id, &list).await?;

    tracing::info!(
        shop_id = summary.shop_id,
        offers = summary.offers,
        replaced = summary.replaced,
        "import finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopdb_core::Environment;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn test_config(max_upload_bytes: usize) -> AppConfig {
        AppConfig {
            database_url: "postgres://unused".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            log_level: "info".to_string(),
            token_salt: "salt".to_string(),
            db_max_connections: 1,
            db_min_connections: 1,
            db_acquire_timeout_secs: 1,
            fetch_timeout_secs: 5,
            fetch_user_agent: "shopdb-test".to_string(),
            max_upload_bytes,
            rate_limit_per_minute: 60,
        }
    }

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../shopdb-importer/tests/fixtures/shop1.yaml")
    }

    #[test]
    fn source_requires_exactly_one_input() {
        assert_eq!(
            Source::from_args(None, Some("https://x.test/a.yaml".to_string())).expect("url"),
            Source::Url("https://x.test/a.yaml".to_string())
        );
        assert!(Source::from_args(None, None).is_err());
        assert!(Source::from_args(Some(fixture()), Some("https://x.test".to_string())).is_err());
    }

    #[tokio::test]
    async fn loads_fixture_from_disk() {
        let list = load_price_list(&test_config(1024 * 1024), &Source::File(fixture()))
            .await
            .expect("fixture should load");
        assert_eq!(list.shop, "Connected");
        assert!(!list.goods.is_empty());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let err = load_price_list(&test_config(16), &Source::File(fixture()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds 16 bytes"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = load_price_list(
            &test_config(1024),
            &Source::File(PathBuf::from("/nonexistent/price.yaml")),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/price.yaml"));
    }
}
