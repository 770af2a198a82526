//! Error types for the template library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for metadata, binding and template operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Library tag has no entry in the metadata store
    #[error("Library tag not found in metadata: {0}")]
    TagNotFound(String),

    /// Source file has no entry under the given tag
    #[error("Asset not found under tag {tag}: {source_path}")]
    AssetNotFound { tag: String, source_path: String },

    /// Render target missing from the binding scheme
    #[error("Unknown render target: {0}")]
    UnknownRenderTarget(String),

    /// Scheme maps onto an input the shader node does not have
    #[error("Unknown {stage} input: {input}")]
    UnknownInput { stage: String, input: String },

    /// Upstream traversal met a node twice on the same path
    #[error("Cycle detected in node graph at {0}")]
    CycleDetected(String),

    /// Host node-graph operation failed
    #[error("Host operation failed: {0}")]
    Host(String),

    /// Invalid configuration or scheme document
    #[error("Invalid scheme: {0}")]
    InvalidScheme(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Atomic rename of the metadata store failed
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a host operation error.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }
}

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::UnknownInput { stage: "surface".into(), input: "albedo".into() };
        assert!(e.to_string().contains("surface"));
        assert!(e.to_string().contains("albedo"));

        let e = Error::AssetNotFound { tag: "KB".into(), source_path: "/a/b.bgeo".into() };
        assert!(e.to_string().contains("KB"));
        assert!(e.to_string().contains("/a/b.bgeo"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
