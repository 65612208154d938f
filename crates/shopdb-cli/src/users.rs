use shopdb_core::AccountType;

/// Create an account with a fresh bearer token and print the token.
///
/// Only the salted hash is stored, so the printed token cannot be recovered
/// later.
///
/// # Errors
///
/// Returns an error if the insert fails, e.g. the email is already taken.
pub(crate) async fn run_create_user(
    pool: &sqlx::PgPool,
    token_salt: &str,
    email: &str,
    account_type: AccountType,
) -> anyhow::Result<()> {
    let token = shopdb_db::generate_token();
    let user = shopdb_db::create_user(
        pool,
        email,
        account_type,
        &shopdb_db::hash_token(token_salt, &token),
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            anyhow::anyhow!("user '{email}' already exists")
        } else {
            anyhow::Error::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, account_type = %account_type.as_str(), "user created");
    println!("created {} user {} (id {})", account_type.as_str(), user.email, user.id);
    println!("token: {token}");
    Ok(())
}
