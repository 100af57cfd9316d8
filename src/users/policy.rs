//! Username and password rules for new and changed accounts.
//!
//! Checks run in a fixed order and stop at the first failure, so the
//! error names the most basic problem first.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{Result, VaultError};

pub const USERNAME_MIN_LEN: usize = 8;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-zA-Z0-9_-]+$").expect("username pattern is valid"))
}

/// Check length, characters, and first character of a username.
///
/// Whether the name is already taken is the caller's concern.
pub fn check_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(VaultError::Username(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters long."
        )));
    }

    if !username_pattern().is_match(username) {
        return Err(VaultError::Username(
            "Username must contain only letters, numbers, underscores, and dashes.".into(),
        ));
    }

    if !username.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(VaultError::Username(
            "Username must start with a letter.".into(),
        ));
    }

    Ok(())
}

/// Check a candidate password: at least 8 characters with a lowercase
/// letter, an uppercase letter, a digit, and a symbol.
pub fn check_password(password: &[u8]) -> Result<()> {
    let Ok(text) = std::str::from_utf8(password) else {
        return Err(VaultError::InvalidPassword(
            "Password must be valid UTF-8 text.".into(),
        ));
    };

    if text.chars().count() < PASSWORD_MIN_LEN {
        return Err(VaultError::InvalidPassword(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters long."
        )));
    }

    let has_lower = text.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = text.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    let has_symbol = text.chars().any(|c| !c.is_ascii_alphanumeric());

    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Err(VaultError::InvalidPassword(
            "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character."
                .into(),
        ));
    }

    Ok(())
}
