//! Account registration field validation.
//!
//! Each validator returns `Ok(())` for acceptable input or error objects that
//! carry a machine-readable code and a reason suitable for display. Password
//! validation reports every failed rule, so it returns a list.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{Email, EmailError};

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length under the default policy.
pub const MIN_PASSWORD_LENGTH: usize = 6;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid regex"));

/// Machine-readable validation failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    InvalidUsername,
    InvalidEmail,
    InvalidPassword,
}

/// A single failed validation rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{reason}")]
pub struct ValidationError {
    pub error: ValidationCode,
    pub reason: String,
}

impl ValidationError {
    fn new(error: ValidationCode, reason: impl Into<String>) -> Self {
        Self {
            error,
            reason: reason.into(),
        }
    }
}

/// How strictly a password is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// Enforce the registration rules (minimum length).
    #[default]
    Strict,
    /// Only require that a password was supplied, e.g. at sign-in.
    Exists,
}

/// Validate a username.
///
/// # Errors
///
/// Returns `InvalidUsername` when the username is shorter than
/// [`MIN_USERNAME_LENGTH`] or contains anything other than ASCII letters,
/// digits, `_` or `-`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() >= MIN_USERNAME_LENGTH && USERNAME_RE.is_match(username) {
        return Ok(());
    }

    Err(ValidationError::new(
        ValidationCode::InvalidUsername,
        format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters long and may only contain letters, numbers, dashes and underscores"
        ),
    ))
}

/// Validate an email address.
///
/// Blank input (after trimming) is accepted only when the field is optional.
///
/// # Errors
///
/// Returns `InvalidEmail` when a supplied address is malformed, or when a
/// required address is blank.
pub fn validate_email(email: &str, optional: bool) -> Result<(), ValidationError> {
    match Email::parse(email) {
        Ok(_) => Ok(()),
        Err(EmailError::Empty) if optional => Ok(()),
        Err(EmailError::Empty) => Err(ValidationError::new(
            ValidationCode::InvalidEmail,
            "Email address is required",
        )),
        Err(e) => Err(ValidationError::new(
            ValidationCode::InvalidEmail,
            format!("Email address is invalid: {e}"),
        )),
    }
}

/// Validate a password against a policy.
///
/// # Errors
///
/// Returns every failed rule as an `InvalidPassword` error.
pub fn validate_password(password: &str, policy: PasswordPolicy) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match policy {
        PasswordPolicy::Exists => {
            if password.is_empty() {
                errors.push(ValidationError::new(
                    ValidationCode::InvalidPassword,
                    "Password is required",
                ));
            }
        }
        PasswordPolicy::Strict => {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                errors.push(ValidationError::new(
                    ValidationCode::InvalidPassword,
                    format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
