//! Input validation for credential fields.

use thiserror::Error;

/// Minimum display-name length, in characters.
pub const MIN_NAME_CHARS: usize = 2;
/// Minimum password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;
/// bcrypt ignores everything past 72 bytes, so longer passwords are refused.
pub const MAX_PASSWORD_BYTES: usize = 72;
const MAX_EMAIL_BYTES: usize = 254;

/// A field that failed validation, safe to report back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a display name, returning it trimmed.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError::new(
            "name",
            format!("Name must be at least {MIN_NAME_CHARS} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Validate the shape of an email address, returning it without surrounding
/// whitespace. Case is preserved: emails match exactly as stored.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    let invalid = || ValidationError::new("email", "Enter a valid email address");

    if email.is_empty() || email.len() > MAX_EMAIL_BYTES || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(email.to_string())
}

/// Validate a new password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at most {MAX_PASSWORD_BYTES} bytes"),
        ));
    }
    Ok(())
}
