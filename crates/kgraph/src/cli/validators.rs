//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is rejected at
//! parse time with a specific message.

use crate::domain::MAX_NAME_LENGTH;

/// Validate an id prefix.
///
/// Delegates to [`crate::config::validate_prefix`].
pub fn validate_prefix(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    crate::config::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate a vertex name: non-empty, single-line, at most
/// [`MAX_NAME_LENGTH`] characters.
pub fn validate_name(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    let length = s.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters, got {length} characters"
        ));
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Name cannot contain newline characters".to_string());
    }

    Ok(s.to_string())
}

/// Validate a vertex or edge id: non-empty, no whitespace.
///
/// Ids are opaque, so no prefix format is enforced; snapshots may hold
/// ids synthesized under a different prefix.
pub fn validate_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Id cannot be empty".to_string());
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!("Invalid id '{s}': ids cannot contain whitespace"));
    }

    Ok(s.to_string())
}

/// Validate a tenant, user or team identifier.
pub fn validate_principal(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if s.chars().any(char::is_control) {
        return Err("Identifier cannot contain control characters".to_string());
    }

    Ok(s.to_string())
}

/// Validate a `key=value` metadata entry.
pub fn validate_metadata(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid metadata '{s}'. Expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("Metadata key cannot be empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}
