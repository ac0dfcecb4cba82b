//! Account field validation commands.
//!
//! # Usage
//!
//! ```bash
//! shop-search validate username tenten
//! shop-search validate email email@website.com
//! shop-search validate password abc123
//! ```

use shop_search_core::PasswordPolicy;
use shop_search_core::validation::{validate_email, validate_password, validate_username};

use super::CommandError;

/// Validate a username.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if the username is rejected.
pub fn username(value: &str) -> Result<(), CommandError> {
    validate_username(value).map_err(|e| CommandError::Invalid(vec![e]))?;
    tracing::info!("Username is valid");
    Ok(())
}

/// Validate an email address.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if the address is rejected.
pub fn email(value: &str, optional: bool) -> Result<(), CommandError> {
    validate_email(value, optional).map_err(|e| CommandError::Invalid(vec![e]))?;
    tracing::info!("Email is valid");
    Ok(())
}

/// Validate a password.
///
/// # Errors
///
/// Returns `CommandError::Invalid` with every failed rule.
pub fn password(value: &str, exists: bool) -> Result<(), CommandError> {
    let policy = if exists {
        PasswordPolicy::Exists
    } else {
        PasswordPolicy::Strict
    };
    validate_password(value, policy).map_err(CommandError::Invalid)?;
    tracing::info!("Password is valid");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(username("tenten").is_ok());
        assert!(matches!(username("tn"), Err(CommandError::Invalid(_))));
    }

    #[test]
    fn test_email() {
        assert!(email("", true).is_ok());
        assert!(email("", false).is_err());
        assert!(email("email@website.com", false).is_ok());
    }

    #[test]
    fn test_password_reasons_are_reported() {
        let err = password("abc12", false).unwrap_err();
        assert!(err.to_string().contains("at least 6 characters"));
        assert!(password("abc12", true).is_ok());
    }
}
