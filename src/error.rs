//! Error types for the envelope cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the envelope cache.
///
/// Missing keys are not errors: the public operations report them through
/// `None`/`false` sentinels.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Delta update applied to a non-numeric payload
    #[error("Type mismatch for key {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// Insert-if-absent found an existing key
    #[error("Key already exists: {0}")]
    OverwriteRefused(String),

    /// Envelope bytes could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Key pattern is not a valid regular expression
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Raw store declined a write
    #[error("Raw store rejected write: {0}")]
    StoreRejected(String),
}

impl CacheError {
    /// Returns true when the error is a policy refusal rather than a failure.
    pub fn is_refusal(&self) -> bool {
        matches!(self, CacheError::OverwriteRefused(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Encoding(err.to_string())
    }
}

impl From<regex::Error> for CacheError {
    fn from(err: regex::Error) -> Self {
        CacheError::InvalidPattern(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the envelope cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_is_distinct() {
        assert!(CacheError::OverwriteRefused("k".to_string()).is_refusal());
        assert!(!CacheError::StoreRejected("k".to_string()).is_refusal());
        assert!(!CacheError::Encoding("bad".to_string()).is_refusal());
    }

    #[test]
    fn test_regex_error_maps_to_invalid_pattern() {
        let err: CacheError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, CacheError::InvalidPattern(_)));
    }

    #[test]
    fn test_json_error_maps_to_encoding() {
        let err: CacheError = serde_json::from_slice::<u8>(b"{").unwrap_err().into();
        assert!(matches!(err, CacheError::Encoding(_)));
    }
}
