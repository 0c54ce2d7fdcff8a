//! The [`DatabaseAdapter`] contract implemented by every storage backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use vcat_refs::{NamedRef, Reference};
use vcat_store::CommitLogEntry;
use vcat_types::{CommitHash, CommitMeta, Content, ContentKey, Entry, Operation};

use crate::config::AdapterConfig;
use crate::diff::Difference;
use crate::error::AdapterResult;
use crate::walk::KeyListEntry;

/// Lazily evaluated sequence of adapter results.
pub type AdapterIter<'a, T> = Box<dyn Iterator<Item = AdapterResult<T>> + 'a>;

/// A versioned store: references, an immutable commit log and global state.
///
/// Every mutation of a reference presents the hash the caller believes is
/// current and fails with `ReferenceConflict` otherwise. Adapters never
/// retry or rebase on the caller's behalf.
pub trait DatabaseAdapter: Send + Sync {
    /// The configuration this adapter was built with.
    fn config(&self) -> &AdapterConfig;

    /// Create `default_branch` at the empty history if the repository has no
    /// references. Calling it again is a no-op.
    fn initialize_repo(&self, default_branch: &str) -> AdapterResult<()>;

    /// Hash of the empty history.
    fn no_ancestor_hash(&self) -> CommitHash {
        CommitHash::NO_ANCESTOR
    }

    /// Resolve a reference, by name, to a commit on it.
    ///
    /// With `hash == None` this is the current head. Otherwise `hash` must
    /// be the head or one of its ancestors.
    fn hash_on_reference(&self, name: &str, hash: Option<CommitHash>)
        -> AdapterResult<CommitHash>;

    /// Read a branch or tag by name.
    fn get_reference(&self, name: &str) -> AdapterResult<Reference>;

    /// All branches and tags, sorted by name.
    fn named_refs(&self) -> AdapterResult<Vec<Reference>>;

    /// Create a branch or tag pointing at `from`.
    fn create_reference(&self, named: &NamedRef, from: CommitHash) -> AdapterResult<Reference>;

    /// Delete a branch or tag that still points at `expected`.
    fn delete_reference(&self, named: &NamedRef, expected: CommitHash) -> AdapterResult<()>;

    /// Point a branch or tag that is at `expected` to any existing commit.
    fn assign(
        &self,
        named: &NamedRef,
        expected: CommitHash,
        to: CommitHash,
    ) -> AdapterResult<Reference>;

    /// Append a commit to `branch` whose head must be `expected`.
    ///
    /// Operations must target distinct keys. Returns the new head.
    fn commit(
        &self,
        branch: &str,
        expected: CommitHash,
        operations: Vec<Operation>,
        meta: CommitMeta,
    ) -> AdapterResult<CommitHash>;

    /// Commits from `head` back to the root, newest first.
    fn commit_log(&self, head: CommitHash) -> AdapterResult<AdapterIter<'_, Arc<CommitLogEntry>>>;

    /// Every live key at `at` with its on-reference content.
    fn keys(&self, at: CommitHash) -> AdapterResult<AdapterIter<'_, KeyListEntry>>;

    /// Every live key at `at` with its content type.
    fn get_entries(&self, at: CommitHash) -> AdapterResult<AdapterIter<'_, Entry>> {
        Ok(Box::new(
            self.keys(at)?.map(|entry| entry.map(|entry| entry.to_entry())),
        ))
    }

    /// Content of `keys` at `at`, with the current global state attached.
    /// Absent keys are omitted.
    fn get_values(
        &self,
        at: CommitHash,
        keys: &[ContentKey],
    ) -> AdapterResult<BTreeMap<ContentKey, Content>>;

    /// Keys whose content differs between `from` and `to`, ordered by key.
    fn diff(&self, from: CommitHash, to: CommitHash) -> AdapterResult<Vec<Difference>>;

    /// Replay the commits on `from` since its common ancestor with the head
    /// of `to_branch` onto that branch. Returns the new head.
    fn merge(
        &self,
        from: CommitHash,
        to_branch: &str,
        expected: CommitHash,
    ) -> AdapterResult<CommitHash>;

    /// Replay `commits` (oldest first) onto `to_branch`. Returns the new head.
    fn transplant(
        &self,
        to_branch: &str,
        expected: CommitHash,
        commits: &[CommitHash],
    ) -> AdapterResult<CommitHash>;
}
