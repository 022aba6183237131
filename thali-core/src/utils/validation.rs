//! Input validation helpers
//!
//! Limits are chosen based on:
//! - 58mm/80mm thermal printer line width
//! - Reasonable UX limits for names and codes

use super::{AppError, AppResult, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: counter items, menu items, hotel name
pub const MAX_NAME_LEN: usize = 200;

/// Counter item lookup codes
pub const MAX_CODE_LEN: usize = 16;

/// Greeting / address lines on the receipt
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Minimum admin / account password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        ));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: &Option<String>, field: &str, max_len: usize) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Minimal email shape check; the auth provider owns real validation
pub fn validate_email(email: &str) -> AppResult<()> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation(format!("Invalid email: {email}"))),
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Tea", "name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert!(validate_required_text("ABCDEFGHIJKLMNOPQ", "code", MAX_CODE_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "nameLocal", MAX_NAME_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(201)), "nameLocal", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("owner@hotel.in").is_ok());
        assert!(validate_email("owner").is_err());
        assert!(validate_email("@hotel.in").is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("abc").is_err());
    }
}
