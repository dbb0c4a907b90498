//! Error taxonomy for fragment storage and conversion.
//!
//! Every failure path surfaces a distinct kind so an adapter can pick the
//! externally visible status. Listing is the one place errors are swallowed
//! (see [`crate::Fragment::list_by_owner`]).

use thiserror::Error;

/// Result type for fragment operations.
pub type FragmentResult<T> = Result<T, FragmentError>;

/// Fragment errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    // Construction
    #[error("invalid owner id")]
    InvalidOwner,

    #[error("unsupported fragment type: {0}")]
    UnsupportedType(String),

    #[error("invalid size: {0}")]
    InvalidSize(String),

    // Data writes
    #[error("fragment data must not be empty")]
    EmptyData,

    #[error("content type does not match: fragment is {expected}, got {declared}")]
    TypeMismatch { expected: String, declared: String },

    // Lookup
    #[error("fragment not found: {0}")]
    NotFound(String),

    // Conversion
    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    // Storage
    #[error("I/O error: {0}")]
    Io(String),
}

impl FragmentError {
    /// HTTP-class status an adapter should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            FragmentError::InvalidOwner => 401,
            FragmentError::UnsupportedType(_) => 415,
            FragmentError::InvalidSize(_) => 400,
            FragmentError::EmptyData => 400,
            FragmentError::TypeMismatch { .. } => 400,
            FragmentError::NotFound(_) => 404,
            FragmentError::UnsupportedConversion { .. } => 415,
            FragmentError::ConversionFailed(_) => 422,
            FragmentError::Io(_) => 500,
        }
    }

    /// Only storage failures are worth retrying, and the core never does so
    /// itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FragmentError::Io(_))
    }
}

impl From<std::io::Error> for FragmentError {
    fn from(err: std::io::Error) -> Self {
        FragmentError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FragmentError {
    fn from(err: serde_json::Error) -> Self {
        FragmentError::Io(format!("metadata encoding: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FragmentError::InvalidOwner.status_code(), 401);
        assert_eq!(FragmentError::UnsupportedType("application/pdf".into()).status_code(), 415);
        assert_eq!(FragmentError::EmptyData.status_code(), 400);
        assert_eq!(FragmentError::NotFound("abc".into()).status_code(), 404);
        assert_eq!(
            FragmentError::TypeMismatch {
                expected: "text/plain".into(),
                declared: "text/markdown".into(),
            }
            .status_code(),
            400
        );
        assert_eq!(FragmentError::Io("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_refusal_and_failure_are_distinct() {
        let refused = FragmentError::UnsupportedConversion {
            from: "image/jpeg".into(),
            to: "html".into(),
        };
        let broke = FragmentError::ConversionFailed("bad bytes".into());
        assert_ne!(refused.status_code(), broke.status_code());
    }

    #[test]
    fn test_only_io_is_retryable() {
        assert!(FragmentError::Io("timeout".into()).is_retryable());
        assert!(!FragmentError::NotFound("x".into()).is_retryable());
        assert!(!FragmentError::ConversionFailed("x".into()).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: FragmentError = io.into();
        assert!(matches!(err, FragmentError::Io(msg) if msg.contains("denied")));
    }
}
