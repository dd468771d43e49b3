//! Input checks shared by the request schemas.

use uuid::{Uuid, Variant};

use crate::errors::AppError;

/// Parses a canonical hyphenated UUID (8-4-4-4-12 hex).
///
/// Accepts versions 1 through 8 with the RFC 4122 variant, plus the nil UUID.
/// Simple, braced and URN forms are rejected even though `Uuid` could read them.
pub fn parse_uuid(field: &str, value: &str) -> Result<Uuid, AppError> {
    let invalid = || AppError::Validation(format!("{field} must be a valid UUID"));

    if value.len() != 36 {
        return Err(invalid());
    }
    let shape_ok = value.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    });
    if !shape_ok {
        return Err(invalid());
    }

    let uuid = Uuid::try_parse(value).map_err(|_| invalid())?;
    if uuid.is_nil() {
        return Ok(uuid);
    }
    let version_ok = matches!(uuid.get_version_num(), 1..=8);
    if !version_ok || uuid.get_variant() != Variant::RFC4122 {
        return Err(invalid());
    }
    Ok(uuid)
}

/// Trims `value` and enforces an inclusive character-count range.
pub fn bounded_text(field: &str, value: &str, min: usize, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(AppError::Validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if len > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}
