//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible failure modes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A sort key string did not name any known key.
    #[error("unknown sort key: {0}")]
    UnknownSortKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnknownSortKey("color".to_string());
        assert_eq!(err.to_string(), "unknown sort key: color");
    }
}
