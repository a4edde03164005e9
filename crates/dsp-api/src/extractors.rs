//! # Validated JSON Extraction
//!
//! Request bodies arrive as `Result<Json<T>, JsonRejection>` so
//! deserialization failures map to structured 422 responses instead of
//! axum's default plain-text rejection, then pass through the type's
//! [`Validate`] implementation.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Semantic validation for request bodies, run after deserialization.
pub trait Validate {
    /// Check field-level invariants. Return a human-readable reason on
    /// failure.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body and run its validation.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        ok: bool,
    }

    impl Validate for Probe {
        fn validate(&self) -> Result<(), String> {
            if self.ok {
                Ok(())
            } else {
                Err("probe rejected".to_string())
            }
        }
    }

    #[test]
    fn test_valid_body_passes() {
        let extracted = extract_validated_json(Ok(Json(Probe { ok: true })));
        assert!(extracted.is_ok());
    }

    #[test]
    fn test_failing_validation_maps_to_validation_error() {
        let result = extract_validated_json(Ok(Json(Probe { ok: false })));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
