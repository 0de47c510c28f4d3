//! Field validation shared by the create and patch paths.

use crate::StoreError;

/// Trims `value` and requires 1..=`max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    bounded(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Length-checks an optional free-text field without altering it.
pub(crate) fn optional_text(
    field: &str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, StoreError> {
    if let Some(ref v) = value {
        bounded(field, v, max)?;
    }
    Ok(value)
}

fn bounded(field: &str, value: &str, max: usize) -> Result<(), StoreError> {
    let len = value.chars().count();
    if len > max {
        return Err(StoreError::Validation(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

/// Unwraps a patch value for a field that has no `NULL` state.
pub(crate) fn not_null<T>(field: &str, value: Option<T>) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::Validation(format!("{field} cannot be null")))
}

pub(crate) fn positive_int(field: &str, value: i64) -> Result<i64, StoreError> {
    if value <= 0 {
        return Err(StoreError::Validation(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(value)
}

pub(crate) fn non_negative_int(field: &str, value: i64) -> Result<i64, StoreError> {
    if value < 0 {
        return Err(StoreError::Validation(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(value)
}

/// Rejects zero, negative, NaN and infinite values.
pub(crate) fn positive_number(field: &str, value: f64) -> Result<f64, StoreError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(StoreError::Validation(format!(
            "{field} must be a positive number, got {value}"
        )));
    }
    Ok(value)
}
