//! Journal entry content rules.

use crate::error::CoreError;

/// Upper bound on entry length, in characters.
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Reject blank or oversized entry content.
pub fn validate_entry_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("Entry content must not be empty".into()));
    }
    let chars = content.chars().count();
    if chars > MAX_CONTENT_CHARS {
        return Err(CoreError::Validation(format!(
            "Entry content is {chars} characters, maximum is {MAX_CONTENT_CHARS}"
        )));
    }
    Ok(())
}
