//! Reusable field validators
//!
//! These validators are used by [`ListingDraft`](crate::core::listing::ListingDraft)
//! and [`ListingPatch`](crate::core::listing::ListingPatch) to check user input

use crate::core::error::ValidationError;

/// Validator: text field is required (non-empty after trimming)
///
/// Returns the trimmed value.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required { field })
    } else {
        Ok(trimmed)
    }
}

/// Validator: text must not exceed `max` characters
pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        Err(ValidationError::TooLong { field, max, actual })
    } else {
        Ok(())
    }
}

/// Validator: number must be finite and strictly positive
pub fn positive(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NonPositivePrice {
            value: value.to_string(),
        })
    }
}

/// Validator: text must parse as a positive price
pub fn price(value: &str) -> Result<f64, ValidationError> {
    let trimmed = required("price", value)?;
    let parsed: f64 = trimmed.parse().map_err(|_| ValidationError::InvalidPrice {
        value: trimmed.to_string(),
    })?;
    positive(parsed)
}
