//! JWT signing and validation.
//!
//! All tokens are HMAC-SHA256 signed with the process-wide symmetric key.
//! Two decode paths exist: the full validation used by the request guard,
//! and a structural validation that skips the expiry check, used only by
//! the refresh flow (exchanging an expired token is the whole point).

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Generate a new signed access token for a user.
///
/// Returns the compact token together with its claims; the caller needs
/// the `jti` to correlate the refresh token record.
///
/// # Errors
/// Returns error if signing fails.
pub fn generate_access_token(
    user_id: &Uuid,
    email: &str,
    config: &JwtSettings,
) -> Result<(String, Claims), AppError> {
    let claims = Claims::new(
        *user_id,
        email.to_string(),
        config.access_token_expiry,
        config.issuer.clone(),
    );

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok((token, claims))
}

/// Validate an access token and extract its claims.
///
/// Enforces signature, algorithm, issuer, and expiry. Used by the request
/// guard on protected routes.
///
/// # Errors
/// Returns error if the token is invalid, expired, or tampered with.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        AppError::Auth(AuthError::InvalidToken)
    })
}

/// Structurally validate an access token without enforcing expiry.
///
/// Signature, algorithm, and issuer must still be valid; only the `exp`
/// check is skipped. The refresh protocol decides what to do with the
/// expiry itself.
///
/// # Errors
/// Returns `InvalidToken` if the signature, algorithm, or issuer is wrong.
pub fn decode_expired_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.validate_exp = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT structural validation error: {}", e);
        AppError::Auth(AuthError::InvalidToken)
    })
}
