//! Field rules shared by the store and by anything that wants to reject bad
//! input before it reaches the database.
//!
//! Lengths are counted in characters (Unicode scalar values), not bytes.

use crate::constants::{BADGER_MAX_CHARS, MATRIX_NAME_MAX_CHARS};
use crate::error::ValidationError;

/// Reject an empty value for a required field.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::RequiredFieldMissing { field });
    }
    Ok(())
}

/// Reject a value longer than `max` characters.
pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::LengthExceeded { field, max, actual });
    }
    Ok(())
}

/// `badger` may be blank but never longer than 30 characters.
pub fn validate_badger(badger: &str) -> Result<(), ValidationError> {
    max_chars("badger", badger, BADGER_MAX_CHARS)
}

pub fn validate_matrix_name(name: &str) -> Result<(), ValidationError> {
    require("name", name)?;
    max_chars("name", name, MATRIX_NAME_MAX_CHARS)
}

/// Unbounded but required text (`description`, `matrix`).
pub fn validate_matrix_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)
}
