//! Input validators for request payloads.
//!
//! Length limits first (cheap rejection of oversized input), then format.
//! All persistence goes through bound sqlx parameters, so validation here
//! is about data quality, not query safety.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, ValidationError};

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_POST_NAME_LENGTH: usize = 280;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address and returns the normalized (trimmed) value.
pub fn is_valid_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()).into());
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH).into());
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH).into());
    }

    if !EMAIL_REGEX.is_match(trimmed) || trimmed.matches('@').count() != 1 {
        return Err(ValidationError::InvalidFormat("email".to_string()).into());
    }

    Ok(trimmed.to_string())
}

/// Validates a post name and returns the normalized (trimmed) value.
pub fn is_valid_post_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name".to_string()).into());
    }

    if trimmed.len() > MAX_POST_NAME_LENGTH {
        return Err(ValidationError::TooLong("name".to_string(), MAX_POST_NAME_LENGTH).into());
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("name".to_string()).into());
    }

    Ok(trimmed.to_string())
}
