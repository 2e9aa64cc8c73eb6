//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is reported at parse
//! time.

use crate::domain::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, Point};

/// Validate a tree ID prefix.
///
/// Delegates to `commands::init` so the rules live in one place.
pub fn validate_prefix(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate an ID of the form `prefix-suffix` (`skill-a3f8`, `node-0k2m`).
pub fn validate_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("ID cannot be empty".to_string());
    }

    let Some((prefix, suffix)) = s.split_once('-') else {
        return Err(format!(
            "Invalid ID format: '{s}'. Expected format: prefix-suffix (e.g., skill-a3f8)"
        ));
    };

    validate_prefix(prefix).map_err(|e| format!("ID {}", e.to_lowercase()))?;

    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("ID suffix must be alphanumeric, got '{suffix}'"));
    }

    Ok(s.to_string())
}

/// Validate a title or name: trimmed, single-line, at most
/// [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    let len = s.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {len} characters"
        ));
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    if let Some(pos) = s.chars().position(|c| c.is_control() && c != '\t') {
        return Err(format!(
            "Title contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate a description: multi-line allowed, at most
/// [`MAX_DESCRIPTION_LENGTH`] characters.
pub fn validate_description(s: &str) -> Result<String, String> {
    let len = s.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters, got {len} characters"
        ));
    }

    if let Some(pos) = s
        .chars()
        .position(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        return Err(format!(
            "Description contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Parse a canvas position written as `X,Y`.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("Expected a position as X,Y, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("Invalid coordinate '{}'", v.trim()))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}
