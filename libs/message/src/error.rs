//! Error types for envelope construction and the wire codec.

use thiserror::Error;

/// Errors raised while building or validating an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// A required key is absent from the payload.
    #[error("missing message field: {0}")]
    MissingField(String),

    /// A key is present but its value violates a constraint.
    #[error("invalid message field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        FieldError::MissingField(field.into())
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            FieldError::MissingField(field) => field,
            FieldError::InvalidField { field, .. } => field,
        }
    }

    /// Returns true if this error indicates an absent key.
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldError::MissingField(_))
    }

    /// Returns true if this error indicates a present but invalid value.
    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldError::InvalidField { .. })
    }
}

/// Errors raised by the JSON wire codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not valid JSON, or could not be rendered as JSON.
    #[error("json error: {0}")]
    Json(String),

    /// The top-level JSON value has the wrong shape.
    #[error("expected a JSON {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    /// A date-time carries precision the wire format cannot represent.
    #[error("date-time {0} has sub-microsecond precision")]
    SubMicrosecond(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Json(err.to_string())
    }
}

/// Errors from entry points that both decode and construct an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl MessageError {
    /// Returns the field error, if construction was what failed.
    pub fn as_field_error(&self) -> Option<&FieldError> {
        match self {
            MessageError::Field(err) => Some(err),
            MessageError::Codec(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        assert_eq!(
            FieldError::missing("to_addr").to_string(),
            "missing message field: to_addr"
        );
        assert_eq!(
            FieldError::invalid("event_type", "unknown event_type \"foo\"").to_string(),
            "invalid message field event_type: unknown event_type \"foo\""
        );
    }

    #[test]
    fn test_field_error_accessors() {
        let err = FieldError::invalid("nack_reason", "must not be null");
        assert_eq!(err.field(), "nack_reason");
        assert!(err.is_invalid());
        assert!(!err.is_missing());
    }

    #[test]
    fn test_codec_error_from_serde() {
        let err: CodecError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn test_message_error_wraps_field_error() {
        let err: MessageError = FieldError::missing("timestamp").into();
        assert_eq!(err.as_field_error(), Some(&FieldError::missing("timestamp")));
        assert_eq!(err.to_string(), "missing message field: timestamp");
    }
}
