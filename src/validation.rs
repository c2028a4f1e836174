//! Request validation utilities.

use crate::types::{Error, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Largest history page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Return the trimmed value, or a validation error carrying `message` when
/// the field is absent or blank.
pub fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::validation(message)),
    }
}

/// Like [`require`] but returns the value untouched. Only an absent or empty
/// value is rejected; used for secrets, where whitespace is significant.
pub fn require_exact<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::validation(message)),
    }
}

/// Normalize and sanity-check an email address.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(Error::validation("Please provide a valid email"));
    }
    Ok(email)
}

/// Validate password length.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Clamp pagination parameters to sane bounds (1-based page).
pub fn page_bounds(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}
