//! Sanitization of scalar values bound as query parameters
//!
//! Every value that reaches the query binder through criteria or filters
//! passes through [`sanitize_value`] first. Identifiers never come here; they
//! go through whitelist validation instead (see [`crate::validation`]).
//!
//! The rules are bounded-form normalization, not escaping: binding already
//! prevents injection, sanitization caps what a hostile value can cost
//! (control characters in logs, multi-megabyte strings, non-finite floats
//! that some stores reject at the protocol level).

use sea_orm::Value;

use crate::errors::{RepositoryError, RepositoryResult};

/// Default cap on string-ish scalar length, in characters.
pub const DEFAULT_MAX_SCALAR_LENGTH: usize = 1000;

fn is_control_char(c: char) -> bool {
    matches!(c as u32, 0x00..=0x1F | 0x7F..=0x9F)
}

fn bound_string(s: &str, max_len: usize) -> String {
    s.chars()
        .filter(|c| !is_control_char(*c))
        .take(max_len)
        .collect()
}

/// Normalize one scalar to a safe, bounded form.
///
/// - SQL NULLs pass through unchanged.
/// - Strings are stripped of ASCII control characters and truncated.
/// - Floats must be finite; NaN and infinities fail validation.
/// - JSON payloads are coerced to their string form and truncated; byte
///   blobs are truncated in place.
/// - Booleans, integers, uuids, and chrono values pass through: they are
///   fixed-width, and an invalid `chrono` instant is unrepresentable.
///
/// Idempotent: sanitizing an already-sanitized value is a no-op.
pub fn sanitize_value(entity: &str, value: Value, max_len: usize) -> RepositoryResult<Value> {
    match value {
        Value::String(Some(s)) => Ok(Value::String(Some(Box::new(bound_string(&s, max_len))))),
        Value::Float(Some(f)) => {
            if !f.is_finite() {
                return Err(RepositoryError::validation(entity, "non-finite numeric value"));
            }
            Ok(Value::Float(Some(f)))
        }
        Value::Double(Some(f)) => {
            if !f.is_finite() {
                return Err(RepositoryError::validation(entity, "non-finite numeric value"));
            }
            Ok(Value::Double(Some(f)))
        }
        Value::Json(Some(json)) => Ok(Value::String(Some(Box::new(bound_string(
            &json.to_string(),
            max_len,
        ))))),
        Value::Bytes(Some(mut bytes)) => {
            bytes.truncate(max_len);
            Ok(Value::Bytes(Some(bytes)))
        }
        // NULLs of any type, booleans, integers, chars, uuids, chrono values.
        other => Ok(other),
    }
}
