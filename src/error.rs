//! Error types for the cache backends
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache backend and the registry.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No entry is stored under the key
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The underlying storage failed for a reason other than absence
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded for persistence
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A constructor is already registered under this name
    #[error("Backend already registered: {0}")]
    DuplicateBackend(String),

    /// No constructor is registered under this name
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Construction-time options are invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Wraps an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_found_message() {
        let err = CacheError::NotFound("k1".to_string());
        assert_eq!(err.to_string(), "Key not found: k1");
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = CacheError::io(
            "/tmp/cache/abc",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/cache/abc"));
        assert!(msg.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_serialization_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
