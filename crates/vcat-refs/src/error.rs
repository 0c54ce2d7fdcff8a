//! Error types for reference operations.

use thiserror::Error;
use vcat_types::CommitHash;

/// Errors that can occur during reference operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// A branch or tag with this name already exists.
    #[error("ref already exists: {name}")]
    AlreadyExists { name: String },

    /// The reference name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The reference does not point at the hash the caller expected.
    #[error("ref {name} points at {actual}, expected {expected}")]
    Conflict {
        name: String,
        expected: CommitHash,
        actual: CommitHash,
    },

    /// The backing medium failed (e.g. a poisoned lock).
    #[error("ref storage failure: {0}")]
    Storage(String),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
