//! Normalisation of free-text command fields.

use jamhub_core::error::AppError;
use jamhub_core::result::AppResult;

/// Trim `value` and reject it if nothing is left.
pub fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_argument(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Reject negative and non-finite positions.
pub fn position(seconds: f64) -> AppResult<f64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AppError::invalid_argument(format!(
            "Position must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok(seconds)
}
