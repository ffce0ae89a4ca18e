//! Password hashing and verification.
//!
//! bcrypt for hashing, with a strength policy enforced before any hash is
//! produced.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password using bcrypt.
///
/// # Errors
/// Returns error if the password fails the strength policy or hashing fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its bcrypt hash.
///
/// # Errors
/// Returns error if verification itself fails (malformed hash); a wrong
/// password is `Ok(false)`, not an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Strength policy: 8-128 characters, at least one digit, one lowercase,
/// and one uppercase letter. The upper bound also caps bcrypt input size.
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_not_plaintext() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn correct_password_verifies() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(verify_password(password, &hash).expect("Failed to verify password"));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        let is_valid =
            verify_password("WrongPassword123", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn weak_passwords_are_rejected() {
        let long_password = format!("{}A1", "a".repeat(MAX_PASSWORD_LENGTH));

        assert!(hash_password("Short1").is_err());
        assert!(hash_password(&long_password).is_err());
        assert!(hash_password("NoDigitsHere").is_err());
        assert!(hash_password("NOLOWERCASE1").is_err());
        assert!(hash_password("nouppercase1").is_err());
    }
}
