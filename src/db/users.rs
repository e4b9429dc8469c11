//! Account and session database queries.

use crate::models::{Account, SessionRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::DbPool;

// ============================================================================
// Accounts
// ============================================================================

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

/// Create an account. A duplicate email maps to [`Error::EmailInUse`].
pub async fn create_account(pool: &DbPool, input: CreateAccount) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO users (id, email, password_hash, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => Error::EmailInUse,
        _ => Error::Database(e),
    })
}

pub async fn get_account(pool: &DbPool, id: &str) -> Result<Account> {
    sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

pub async fn get_account_by_email(pool: &DbPool, email: &str) -> Result<Option<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

pub async fn update_last_login(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ============================================================================
// Sessions
// ============================================================================

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn create_session(pool: &DbPool, input: CreateSession) -> Result<SessionRecord> {
    sqlx::query_as::<_, SessionRecord>(
        r#"
        INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&input.token_hash)
    .bind(Utc::now().to_rfc3339())
    .bind(input.expires_at.to_rfc3339())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

pub async fn get_session_by_token_hash(
    pool: &DbPool,
    token_hash: &str,
) -> Result<Option<SessionRecord>> {
    sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

pub async fn touch_session(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_used = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a session. Returns whether a row was removed.
pub async fn delete_session_by_token_hash(pool: &DbPool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete sessions that expired before `now`, returning their token hashes.
pub async fn cleanup_expired_sessions(pool: &DbPool, now: DateTime<Utc>) -> Result<Vec<String>> {
    let purged: Vec<(String,)> =
        sqlx::query_as("DELETE FROM sessions WHERE expires_at < ? RETURNING token_hash")
            .bind(now.to_rfc3339())
            .fetch_all(pool)
            .await?;
    Ok(purged.into_iter().map(|(hash,)| hash).collect())
}
