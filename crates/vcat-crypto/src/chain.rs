use vcat_types::CommitHash;

use crate::hasher::HasherError;

/// An object that participates in a parent-linked commit history.
pub trait HashLinked {
    /// The object's own hash.
    fn hash(&self) -> CommitHash;
    /// The parent's hash (`None` for a root commit).
    fn parent(&self) -> Option<CommitHash>;
    /// Recompute the hash from the object's content.
    fn recompute_hash(&self) -> Result<CommitHash, HasherError>;
}

/// History integrity verifier.
///
/// Verifies that a sequence of commits, oldest first, forms an unbroken
/// history: each commit's parent is the previous commit and each commit's
/// hash matches its content.
pub struct HistoryVerifier;

impl HistoryVerifier {
    /// Verify a complete history starting at a root commit.
    ///
    /// Checks:
    /// 1. The first commit has no parent
    /// 2. Each subsequent commit's parent is the previous commit's hash
    /// 3. Each commit's hash is correct for its content
    pub fn verify_chain(commits: &[impl HashLinked]) -> Result<(), ChainError> {
        let Some(root) = commits.first() else {
            return Ok(());
        };
        if root.parent().is_some() {
            return Err(ChainError::RootHasParent);
        }
        Self::verify_hash(root, 0)?;

        for (index, pair) in commits.windows(2).enumerate() {
            let index = index + 1;
            let expected_parent = pair[0].hash();
            match pair[1].parent() {
                Some(parent) if parent == expected_parent => {}
                Some(_) => return Err(ChainError::BrokenLink { index }),
                None => return Err(ChainError::MissingParent { index }),
            }
            Self::verify_hash(&pair[1], index)?;
        }

        Ok(())
    }

    fn verify_hash(commit: &impl HashLinked, index: usize) -> Result<(), ChainError> {
        let computed = commit.recompute_hash()?;
        if computed != commit.hash() {
            return Err(ChainError::HashMismatch { index });
        }
        Ok(())
    }
}

/// Errors from history verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("root commit has a parent (should be None)")]
    RootHasParent,

    #[error("broken link at index {index}: parent does not match previous commit")]
    BrokenLink { index: usize },

    #[error("missing parent at index {index} (should reference previous commit)")]
    MissingParent { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },

    #[error("hashing failed: {0}")]
    Hasher(#[from] HasherError),
}
