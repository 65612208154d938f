use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let token_salt = require("SHOPDB_TOKEN_SALT")?;

    let env = parse_environment(&or_default("SHOPDB_ENV", "development"))?;

    let bind_addr = parse_var(&lookup, "SHOPDB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SHOPDB_LOG_LEVEL", "info");

    let db_max_connections = parse_var(&lookup, "SHOPDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections: u32 = parse_var(&lookup, "SHOPDB_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPDB_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "must not exceed SHOPDB_DB_MAX_CONNECTIONS ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs = parse_var(&lookup, "SHOPDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let fetch_timeout_secs = parse_var(&lookup, "SHOPDB_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_user_agent = or_default("SHOPDB_FETCH_USER_AGENT", "shopdb/0.1 (price-list-import)");
    let max_upload_bytes = parse_var(&lookup, "SHOPDB_MAX_UPLOAD_BYTES", "5242880")?;
    let rate_limit_per_minute = parse_var(&lookup, "SHOPDB_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        token_salt,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch_timeout_secs,
        fetch_user_agent,
        max_upload_bytes,
        rate_limit_per_minute,
    })
}

fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPDB_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
