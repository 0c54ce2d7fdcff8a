use vcat_crypto::HasherError;
use vcat_types::CommitHash;

/// Errors from commit log and global-state operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested commit was not found.
    #[error("commit not found: {0}")]
    NotFound(CommitHash),

    /// A written entry's hash does not match its content.
    #[error("hash mismatch: entry claims {claimed}, content hashes to {computed}")]
    HashMismatch {
        claimed: CommitHash,
        computed: CommitHash,
    },

    /// Serialization failure while hashing or encoding.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored entry is structurally invalid.
    #[error("corrupt commit {hash}: {reason}")]
    CorruptEntry { hash: CommitHash, reason: String },

    /// The backing medium failed (e.g. a poisoned lock).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<HasherError> for StoreError {
    fn from(e: HasherError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
