//! Error types for the image reinsertion library.
//!
//! The placement core itself never fails on validated input. Errors are
//! raised only at the boundary: building pattern tables, validating
//! configuration and image lists, and loading manifests.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while preparing or running a reinsertion.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A reference pattern failed to compile or is missing required captures
    #[error("Invalid reference pattern '{name}': {reason}")]
    InvalidPattern {
        /// Rule name the pattern belongs to
        name: String,
        /// Reason the pattern was rejected
        reason: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Image list violates the caller contract
    #[error("Invalid image list: {0}")]
    InvalidImageList(String),

    /// Manifest or configuration JSON could not be decoded
    #[error("JSON decode error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
