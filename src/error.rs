// Error types surfaced by the task store

use thiserror::Error;

/// Errors surfaced by store operations.
///
/// A missing record is never an error: lookup-style operations return
/// `Ok(None)` (or `Ok(false)` for delete) so callers can tell malformed
/// input apart from "that record does not currently exist".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Caller-supplied input was malformed (bad id, empty text, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An import payload was not parseable or lacked a `tasks` array.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::InvalidArgument("id must be positive".to_string());
        assert_eq!(err.to_string(), "invalid argument: id must be positive");

        let err = StoreError::InvalidFormat("missing tasks array".to_string());
        assert_eq!(err.to_string(), "invalid format: missing tasks array");
    }
}
