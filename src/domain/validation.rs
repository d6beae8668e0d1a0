/// Input validators
///
/// Length limits keep oversized input out of the store and the password
/// hasher; usernames are restricted to a small character set.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

/// Validates a username for registration
/// - Trims surrounding whitespace
/// - 1 to 50 characters
/// - Letters, digits, `_`, `.` and `-` only
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = check_length("username", username, MAX_USERNAME_LENGTH)?;

    if !USERNAME_REGEX.is_match(&trimmed) {
        return Err(ValidationError::InvalidFormat(
            "username may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }

    Ok(trimmed)
}

/// Validates a password for registration. No strength policy beyond length.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    // bcrypt only looks at the first 72 bytes, the cap mostly bounds hashing cost
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    Ok(())
}

/// Rejects empty values without applying any format rules
pub fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    Ok(())
}

/// Trims `value` and checks it is non-empty and at most `max` characters
pub fn check_length(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong(field.to_string(), max));
    }

    Ok(trimmed.to_string())
}

/// Like [`check_length`] but an absent or blank value becomes `None`
pub fn check_optional_length(
    field: &str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => check_length(field, &v, max).map(Some),
        _ => Ok(None),
    }
}
