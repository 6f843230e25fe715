//! Frame checks applied before parsing.

use jamhub_core::error::AppError;

use super::types::InboundMessage;

/// Rejects empty frames and frames larger than `max_bytes`.
pub fn validate_inbound(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::invalid_argument(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::invalid_argument("Empty message"));
    }

    Ok(())
}

/// Validates and parses one text frame.
pub fn parse_inbound(raw: &str, max_bytes: usize) -> Result<InboundMessage, AppError> {
    validate_inbound(raw, max_bytes)?;
    serde_json::from_str(raw)
        .map_err(|e| AppError::invalid_argument(format!("Failed to parse message: {e}")))
}
