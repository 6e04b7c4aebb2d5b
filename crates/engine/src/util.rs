//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

/// Trim a required free-text field, failing when nothing is left.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(normalize_required_text("  wrong amount ", "reason").unwrap(), "wrong amount");
        assert_eq!(
            normalize_required_text(" ", "reason"),
            Err(EngineError::Validation("reason must not be empty".to_string()))
        );
    }

    #[test]
    fn parse_uuid_labels_errors() {
        assert_eq!(
            parse_uuid("nope", "team"),
            Err(EngineError::Validation("invalid team id".to_string()))
        );
    }
}
