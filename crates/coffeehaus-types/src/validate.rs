//! Profile field rules shared by the user-service and the client forms.

use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const DISPLAY_NAME_MAX_LEN: usize = 50;
pub const BIO_MAX_LEN: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username is required")]
    UsernameRequired,

    #[error("Username must be between 3 and 30 characters")]
    UsernameLength,

    #[error("Username can only contain lowercase letters, numbers, and underscores")]
    UsernameCharacters,

    #[error("Display name is required")]
    DisplayNameRequired,

    #[error("Display name must be at most 50 characters")]
    DisplayNameLength,

    #[error("Bio must be at most 300 characters")]
    BioLength,
}

/// Trim and lowercase raw input the way the username field does on change.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired);
    }
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::UsernameLength);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::UsernameCharacters);
    }
    Ok(())
}

pub fn validate_display_name(display_name: &str) -> Result<(), ValidationError> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::DisplayNameRequired);
    }
    if trimmed.chars().count() > DISPLAY_NAME_MAX_LEN {
        return Err(ValidationError::DisplayNameLength);
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    if bio.chars().count() > BIO_MAX_LEN {
        return Err(ValidationError::BioLength);
    }
    Ok(())
}
