//! JWT claims for access tokens.
//!
//! A fixed, typed claim set (RFC 7519 registered claims plus the custom
//! `id` claim) so validation stays exhaustive; there is no open-ended
//! claim bag to smuggle data through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// User email
    pub email: String,
    /// Unique token identifier, correlates the token with its refresh token
    pub jti: String,
    /// User ID (custom claim, same value as `sub`)
    pub id: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for a fresh access token with a new `jti`.
    pub fn new(user_id: Uuid, email: String, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email,
            jti: Uuid::new_v4().to_string(),
            id: user_id.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract the user ID from the claims.
    ///
    /// # Errors
    /// Returns error if the subject is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::InvalidToken))
    }

    /// Check whether the token has expired.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_creation() {
        let user_id = Uuid::new_v4();
        let email = "test@example.com".to_string();
        let claims = Claims::new(user_id, email.clone(), 3600, "test".to_string());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.id, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.iss, "test");
        assert!(!claims.is_expired());
    }

    #[test]
    fn each_token_gets_a_fresh_jti() {
        let user_id = Uuid::new_v4();
        let a = Claims::new(user_id, "test@example.com".to_string(), 3600, "t".to_string());
        let b = Claims::new(user_id, "test@example.com".to_string(), 3600, "t".to_string());

        assert_ne!(a.jti, b.jti);
        assert!(Uuid::parse_str(&a.jti).is_ok());
    }

    #[test]
    fn negative_expiry_is_already_expired() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            -10,
            "test".to_string(),
        );
        assert!(claims.is_expired());
    }

    #[test]
    fn user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "test@example.com".to_string(), 3600, "test".to_string());

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn invalid_subject_is_rejected() {
        let mut claims = Claims::new(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            3600,
            "test".to_string(),
        );
        claims.sub = "not-a-uuid".to_string();

        assert!(claims.user_id().is_err());
    }
}
