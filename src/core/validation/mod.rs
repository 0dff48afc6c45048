//! Validation of listing input
//!
//! Field-level checks used before any listing data reaches a store.
//! Failures are reported as [`ValidationError`](crate::core::error::ValidationError).

pub mod validators;
