//! Validation of caller-supplied numbers.

use thiserror::Error;

/// A malformed numeric input. These are caller programming errors, so the models refuse them
/// instead of coercing them into some plausible value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The value is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The value is below zero while the quantity can't be.
    #[error("{name} must be non-negative, got {value}")]
    Negative {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The value is finite but outside the range the models are valid for.
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
}

/// Returns the value if it is finite.
pub fn ensure_finite(name: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite { name, value })
    }
}

/// Returns the value if it is finite and not below zero.
pub fn ensure_non_negative(name: &'static str, value: f64) -> Result<f64, InputError> {
    let value = ensure_finite(name, value)?;
    if value < 0. {
        return Err(InputError::Negative { name, value });
    }
    Ok(value)
}

/// Returns the value if it is finite and within `[min, max]`.
pub fn ensure_within(name: &'static str, value: f64, min: f64, max: f64) -> Result<f64, InputError> {
    let value = ensure_finite(name, value)?;
    if value < min || value > max {
        return Err(InputError::OutOfRange { name, value, min, max });
    }
    Ok(value)
}
