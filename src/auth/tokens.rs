//! Token issuance and the refresh protocol.
//!
//! `issue_token_pair` is the only path that mints a jti and the only path
//! that creates refresh token rows; every access token therefore has
//! exactly one correlated refresh record, written before the pair leaves
//! this module. `refresh_token_pair` redeems a pair for a new one, at most
//! once per refresh token.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::jwt::{decode_expired_token, generate_access_token};
use crate::auth::refresh_token::{
    find_refresh_token, generate_refresh_token, redeem_refresh_token, save_refresh_token,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// An issued (access, refresh) token pair.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issue a fresh token pair for a verified user.
///
/// Signs the access token, then persists the refresh record carrying the
/// access token's jti. The pair is returned only after the insert
/// succeeds; a store failure yields an error and no tokens, so a signed
/// token without a refresh record can never reach a client.
pub async fn issue_token_pair(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    let (access_token, claims) = generate_access_token(&user_id, email, config)?;

    let refresh_token = generate_refresh_token();
    save_refresh_token(
        pool,
        user_id,
        &claims.jti,
        &refresh_token,
        config.refresh_token_expiry,
    )
    .await?;

    tracing::debug!(user_id = %user_id, jti = %claims.jti, "Token pair issued");

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Exchange an expired access token plus its refresh token for a new pair.
///
/// Validation order (each failure has its own error):
/// 1. the access token's signature, algorithm, and issuer are valid
///    (expiry deliberately not enforced here);
/// 2. the access token has in fact expired;
/// 3. the refresh token resolves to a stored record;
/// 4. that record is not expired, not invalidated, not used;
/// 5. the record's jwt_id matches the presented token's jti.
///
/// The used-flag flip is a single conditional UPDATE, so two concurrent
/// redemptions of the same refresh token cannot both succeed: the loser
/// gets `RefreshTokenAlreadyUsed` even if its pre-checks raced past the
/// winner's commit.
pub async fn refresh_token_pair(
    pool: &PgPool,
    token: &str,
    refresh_token: &str,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    let claims = decode_expired_token(token, config)?;

    // Refresh exists to replace tokens that have already expired; a
    // still-valid token has no business here.
    if !claims.is_expired() {
        return Err(AuthError::TokenNotYetExpired.into());
    }

    let stored = find_refresh_token(pool, refresh_token)
        .await?
        .ok_or(AuthError::RefreshTokenNotFound)?;

    if stored.is_expired() {
        return Err(AuthError::RefreshTokenExpired.into());
    }

    if stored.invalidated {
        return Err(AuthError::RefreshTokenInvalidated.into());
    }

    if stored.used {
        return Err(AuthError::RefreshTokenAlreadyUsed.into());
    }

    if stored.jwt_id != claims.jti {
        tracing::warn!(
            user_id = %stored.user_id,
            "Refresh token presented with an unrelated access token"
        );
        return Err(AuthError::TokenMismatch.into());
    }

    if !redeem_refresh_token(pool, refresh_token).await? {
        // Lost the race: another request redeemed this token between the
        // read above and the conditional update.
        return Err(AuthError::RefreshTokenAlreadyUsed.into());
    }

    tracing::info!(user_id = %stored.user_id, "Refresh token redeemed");

    issue_token_pair(pool, stored.user_id, &claims.email, config).await
}
