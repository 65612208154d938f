//! Database operations for the `users` table and bearer-token hashing.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use shopdb_core::AccountType;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `users` table. The token hash is never selected.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub account_type: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Parsed account type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRow`] if the stored value is unknown.
    pub fn account_type(&self) -> Result<AccountType, DbError> {
        self.account_type
            .parse()
            .map_err(|e: shopdb_core::CoreError| DbError::CorruptRow(e.to_string()))
    }
}

/// Salted SHA-256 of a bearer token, hex encoded.
#[must_use]
pub fn hash_token(salt: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fresh random bearer token (256 bits, hex encoded).
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Creates a user and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate email).
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    account_type: AccountType,
    token_hash: &str,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (email, account_type, token_hash) \
         VALUES ($1, $2, $3) \
         RETURNING id, email, account_type, created_at",
    )
    .bind(email.trim().to_lowercase())
    .bind(account_type.as_str())
    .bind(token_hash)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Resolves a bearer token to its user, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_token(
    pool: &PgPool,
    salt: &str,
    token: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, account_type, created_at FROM users WHERE token_hash = $1",
    )
    .bind(hash_token(salt, token))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, account_type, created_at FROM users WHERE email = $1",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_token_depends_on_salt() {
        let a = hash_token("salt-a", "token");
        let b = hash_token("salt-b", "token");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_token("salt-a", "token"));
    }

    #[test]
    fn generated_tokens_are_hex_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
