//! Validation rules for reflection tools and their submissions.

use crate::error::CoreError;

/// Lowest allowed before/after mood rating.
pub const MOOD_RATING_MIN: i16 = 1;

/// Highest allowed before/after mood rating.
pub const MOOD_RATING_MAX: i16 = 10;

/// Longest allowed tool path slug.
pub const MAX_PATH_LENGTH: usize = 64;

/// Reject empty or whitespace-only values for a named field.
pub fn validate_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// A tool path is a URL slug: lowercase ASCII letters, digits and hyphens,
/// not starting or ending with a hyphen.
pub fn validate_tool_path(path: &str) -> Result<(), CoreError> {
    let valid_chars = path
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if path.is_empty()
        || path.len() > MAX_PATH_LENGTH
        || !valid_chars
        || path.starts_with('-')
        || path.ends_with('-')
    {
        return Err(CoreError::Validation(format!(
            "Invalid tool path '{path}': use 1-{MAX_PATH_LENGTH} lowercase letters, \
             digits or hyphens"
        )));
    }
    Ok(())
}

/// Ratings must fall within [`MOOD_RATING_MIN`]..=[`MOOD_RATING_MAX`].
pub fn validate_mood_rating(mood: &str, value: i16) -> Result<(), CoreError> {
    if !(MOOD_RATING_MIN..=MOOD_RATING_MAX).contains(&value) {
        return Err(CoreError::Validation(format!(
            "Rating for {mood} must be between {MOOD_RATING_MIN} and {MOOD_RATING_MAX}, got {value}"
        )));
    }
    Ok(())
}
