//! Error types shared across the workspace.

use thiserror::Error;

/// Errors raised while validating input geometry or configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A boundary or headland polygon is unusable.
    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    /// An island definition is unusable.
    #[error("invalid island: {0}")]
    InvalidIsland(String),

    /// A configuration value is out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Convenience result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidBoundary("only 2 vertices".to_string());
        assert_eq!(err.to_string(), "invalid boundary: only 2 vertices");
    }
}
