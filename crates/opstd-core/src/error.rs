//! # Error Types
//!
//! Errors raised by the foundational types, built with `thiserror`.
//! Contract-level rejections (409/401/404) live in `opstd-registry`; the
//! errors here only cover malformed input and serialization failures.

use thiserror::Error;

/// Validation errors for identifier newtypes.
///
/// Each variant carries the offending input so that a misconfigured host
/// can be diagnosed from the message alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Caller identity is empty or whitespace-only.
    #[error("invalid principal: \"{0}\" (must be non-empty)")]
    InvalidPrincipal(String),

    /// Standard identifier is empty or whitespace-only.
    #[error("invalid standard ID: \"{0}\" (must be non-empty)")]
    InvalidStandardId(String),

    /// Franchisee identifier is empty or whitespace-only.
    #[error("invalid franchisee ID: \"{0}\" (must be non-empty)")]
    InvalidFranchiseeId(String),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
