//! Client-side checks on login and signup input.
//!
//! These run before any network call so obviously bad input never costs a
//! round trip (or a retry cycle).

use crate::error::CoreError;

/// Minimum password length accepted at signup.
pub const MIN_SIGNUP_PASSWORD_LEN: usize = 6;

/// Validate an email address shape: one `@` with non-empty local part and
/// a domain containing a dot that neither starts nor ends the domain.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::Validation("Email must not be empty".into()));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(CoreError::Validation(format!(
            "Invalid email '{email}': missing '@'"
        )));
    };

    if local.is_empty() || domain.contains('@') {
        return Err(CoreError::Validation(format!("Invalid email '{email}'")));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(CoreError::Validation(format!(
            "Invalid email '{email}': bad domain"
        )));
    }

    Ok(())
}

/// Validate credentials for an existing account.
pub fn validate_login(email: &str, password: &str) -> Result<(), CoreError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(CoreError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Validate credentials for a new account.
pub fn validate_signup(email: &str, password: &str) -> Result<(), CoreError> {
    validate_email(email)?;
    if password.chars().count() < MIN_SIGNUP_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_SIGNUP_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("  chef.bot+test@mail.example.org ").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "   ", "nobody", "@b.com", "a@b", "a@.com", "a@b.com.", "a@b@c.com"] {
            assert!(validate_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn login_only_requires_a_password() {
        assert!(validate_login("a@b.com", "x").is_ok());
        assert!(validate_login("a@b.com", "").is_err());
    }

    #[test]
    fn signup_enforces_minimum_length() {
        assert!(validate_signup("a@b.com", "secret1").is_ok());
        let err = validate_signup("a@b.com", "abc").unwrap_err();
        assert!(err.to_string().contains("at least 6"));
    }
}
