//! Error types for database adapter operations.

use thiserror::Error;
use vcat_refs::RefError;
use vcat_store::StoreError;
use vcat_types::{CommitHash, ContentId, ContentKey};

/// Errors returned by a [`DatabaseAdapter`](crate::DatabaseAdapter).
///
/// Every variant except [`AdapterError::Storage`] guarantees that nothing
/// was changed by the failed call.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A named reference or commit hash does not resolve.
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// A branch or tag with this name already exists.
    #[error("reference already exists: {0}")]
    ReferenceAlreadyExists(String),

    /// The reference does not point at the hash the caller presented.
    #[error("reference {reference} points at {actual}, expected {expected}")]
    ReferenceConflict {
        reference: String,
        expected: CommitHash,
        actual: CommitHash,
    },

    /// Keys changed on the target since the common ancestor are also
    /// changed by the commits being merged or transplanted.
    #[error("conflicting changes on {reference} for keys: {}", join_keys(.keys))]
    KeyConflict {
        reference: String,
        keys: Vec<ContentKey>,
    },

    /// Two operations in one commit target the same key.
    #[error("duplicate key in commit: {0}")]
    DuplicateKey(ContentKey),

    /// A global-state put has no global value and none exists yet.
    #[error("no global state for content {content_id} at {key}")]
    MissingGlobalState { key: ContentKey, content_id: ContentId },

    /// The reference name violates naming rules.
    #[error("invalid reference name {name}: {reason}")]
    InvalidReferenceName { name: String, reason: String },

    /// The adapter configuration is unusable.
    #[error("invalid adapter config: {0}")]
    InvalidConfig(String),

    /// No factory is registered under this backend name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// The storage medium failed; the outcome of the call is unknown.
    #[error("storage failure: {0}")]
    Storage(String),
}

fn join_keys(keys: &[ContentKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl AdapterError {
    /// `true` when the call changed nothing and can be re-attempted after
    /// re-reading the current state.
    pub fn is_retry_safe(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }

    /// `true` for compare-and-swap mismatches and merge key conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ReferenceConflict { .. } | Self::KeyConflict { .. })
    }

    pub(crate) fn hash_not_found(hash: &CommitHash) -> Self {
        Self::ReferenceNotFound(format!("commit {hash}"))
    }

    pub(crate) fn missing_commit(hash: &CommitHash) -> Self {
        Self::Storage(format!("commit {hash} missing from the commit log"))
    }
}

impl From<RefError> for AdapterError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::NotFound { name } => Self::ReferenceNotFound(name),
            RefError::AlreadyExists { name } => Self::ReferenceAlreadyExists(name),
            RefError::InvalidName { name, reason } => Self::InvalidReferenceName { name, reason },
            RefError::Conflict {
                name,
                expected,
                actual,
            } => Self::ReferenceConflict {
                reference: name,
                expected,
                actual,
            },
            RefError::Storage(msg) => Self::Storage(msg),
        }
    }
}

impl From<StoreError> for AdapterError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Convenience type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
