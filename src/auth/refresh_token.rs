//! Refresh token store access layer.
//!
//! Refresh tokens are opaque 64-character random strings. The database
//! keeps only their SHA-256 hash, together with the `jwt_id` of the access
//! token they were issued with, a `used` flag that flips to true at most
//! once, and an `invalidated` flag set administratively. Rows are kept
//! after redemption for audit and replay detection; only rows that are
//! both used and expired are ever purged.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// A stored refresh token record, as read back from the database.
#[derive(Debug, Clone)]
pub struct StoredRefreshToken {
    pub user_id: Uuid,
    pub jwt_id: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub invalidated: bool,
}

impl StoredRefreshToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Generate a new cryptographically secure opaque refresh token.
///
/// The plaintext is what the client stores; the server keeps only the hash.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Hash a refresh token with SHA-256. Never store plaintext tokens.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persist a refresh token record correlated with an access token's jti.
///
/// # Errors
/// Returns error if the insert fails; the caller must not hand out the
/// token pair in that case.
pub async fn save_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    jwt_id: &str,
    token: &str,
    expiry_seconds: i64,
) -> Result<(), AppError> {
    let token_hash = hash_token(token);
    let now = Utc::now();
    let expires_at = now + Duration::seconds(expiry_seconds);

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (token_hash, jwt_id, user_id, created_at, expires_at, used, invalidated)
        VALUES ($1, $2, $3, $4, $5, false, false)
        "#,
    )
    .bind(token_hash)
    .bind(jwt_id)
    .bind(user_id)
    .bind(now)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a refresh token record by its plaintext value.
///
/// Returns `None` when no row matches. State checks (expiry, used,
/// invalidated, jti correlation) are the refresh protocol's job; this is a
/// plain read.
pub async fn find_refresh_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<StoredRefreshToken>, AppError> {
    let token_hash = hash_token(token);

    let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>, bool, bool)>(
        r#"
        SELECT user_id, jwt_id, expires_at, used, invalidated
        FROM refresh_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(user_id, jwt_id, expires_at, used, invalidated)| StoredRefreshToken {
            user_id,
            jwt_id,
            expires_at,
            used,
            invalidated,
        },
    ))
}

/// Atomically mark a refresh token as used.
///
/// Single conditional UPDATE: exactly one of any number of concurrent
/// callers observes a row flip. Returns `true` for the winner; `false`
/// means the token was already used, invalidated, or expired by the time
/// the update ran.
pub async fn redeem_refresh_token(pool: &PgPool, token: &str) -> Result<bool, AppError> {
    let token_hash = hash_token(token);

    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET used = true
        WHERE token_hash = $1
          AND used = false
          AND invalidated = false
          AND expires_at > $2
        "#,
    )
    .bind(token_hash)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Invalidate all refresh tokens for a user (logout on all devices).
///
/// Sets the administrative `invalidated` flag; rows stay in place for
/// audit. The flag is never reset.
pub async fn invalidate_user_tokens(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET invalidated = true
        WHERE user_id = $1 AND invalidated = false
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    let invalidated = result.rows_affected();
    tracing::info!(user_id = %user_id, invalidated, "Refresh tokens invalidated for user");
    Ok(invalidated)
}

/// Retention sweep: delete rows that are both redeemed and expired.
///
/// Unused or unexpired rows are never touched, so replay detection keeps
/// working for live sessions.
pub async fn purge_spent_tokens(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM refresh_tokens
        WHERE used = true AND expires_at < $1
        "#,
    )
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
