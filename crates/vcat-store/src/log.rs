//! Objects persisted by a database adapter.
//!
//! - [`CommitLogEntry`] - one immutable commit
//! - [`KeyList`] - the full live key space, materialized on checkpoint commits
//! - [`GlobalState`] - the current shared global value of one content id

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use vcat_crypto::{ContentHasher, HashLinked, HasherError};
use vcat_types::{CommitHash, CommitMeta, Content, ContentId, ContentKey, Operation};

use crate::error::StoreResult;

// ---------------------------------------------------------------------------
// Commit log entry
// ---------------------------------------------------------------------------

/// One commit in the log.
///
/// The hash covers `parent`, `operations`, `meta` and `replay_of`.
/// `commit_seq` and `key_list` are derived bookkeeping and are not hashed.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitLogEntry {
    pub hash: CommitHash,
    /// `None` for the first commit after the empty history.
    pub parent: Option<CommitHash>,
    /// Distance from the empty history (the first commit has seq 1).
    pub commit_seq: u64,
    pub meta: CommitMeta,
    pub operations: Vec<Operation>,
    /// Present on checkpoint commits: the live key space after this commit.
    pub key_list: Option<Arc<KeyList>>,
    /// The commit this one was copied from by a merge or transplant.
    pub replay_of: Option<CommitHash>,
}

#[derive(Serialize)]
struct HashInput<'a> {
    parent: Option<CommitHash>,
    operations: &'a [Operation],
    meta: &'a CommitMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay_of: Option<CommitHash>,
}

impl CommitLogEntry {
    /// Build an entry and compute its hash.
    pub fn new(
        parent: Option<CommitHash>,
        commit_seq: u64,
        meta: CommitMeta,
        operations: Vec<Operation>,
        key_list: Option<Arc<KeyList>>,
    ) -> StoreResult<Self> {
        let hash = Self::compute_hash(parent, &operations, &meta, None)?;
        Ok(Self {
            hash,
            parent,
            commit_seq,
            meta,
            operations,
            key_list,
            replay_of: None,
        })
    }

    /// Mark this entry as a copy of `origin` and rehash it.
    pub fn with_replay_of(mut self, origin: CommitHash) -> StoreResult<Self> {
        self.replay_of = Some(origin);
        self.hash = self.recompute_hash()?;
        Ok(self)
    }

    /// The content hash of a commit.
    pub fn compute_hash(
        parent: Option<CommitHash>,
        operations: &[Operation],
        meta: &CommitMeta,
        replay_of: Option<CommitHash>,
    ) -> Result<CommitHash, HasherError> {
        ContentHasher::COMMIT.hash_json(&HashInput {
            parent,
            operations,
            meta,
            replay_of,
        })
    }

    /// The parent hash, with the empty history spelled as
    /// [`CommitHash::NO_ANCESTOR`].
    pub fn parent_or_no_ancestor(&self) -> CommitHash {
        self.parent.unwrap_or(CommitHash::NO_ANCESTOR)
    }

    /// Keys whose value this commit changes (Puts and Deletes).
    pub fn modified_keys(&self) -> impl Iterator<Item = &ContentKey> {
        self.operations
            .iter()
            .filter(|op| op.is_modifying())
            .map(Operation::key)
    }
}

impl HashLinked for CommitLogEntry {
    fn hash(&self) -> CommitHash {
        self.hash
    }

    fn parent(&self) -> Option<CommitHash> {
        self.parent
    }

    fn recompute_hash(&self) -> Result<CommitHash, HasherError> {
        Self::compute_hash(self.parent, &self.operations, &self.meta, self.replay_of)
    }
}

// ---------------------------------------------------------------------------
// Key list
// ---------------------------------------------------------------------------

/// Snapshot of every live key with its on-reference content.
///
/// Values never carry global state; that lives in the global-state store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyList {
    entries: BTreeMap<ContentKey, Content>,
}

impl KeyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&Content> {
        self.entries.get(key)
    }

    /// Insert a value, stripping any global state.
    pub fn insert(&mut self, key: ContentKey, content: &Content) {
        self.entries.insert(key, content.without_global());
    }

    pub fn remove(&mut self, key: &ContentKey) -> Option<Content> {
        self.entries.remove(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ContentKey, &Content)> {
        self.entries.iter()
    }
}

impl FromIterator<(ContentKey, Content)> for KeyList {
    fn from_iter<I: IntoIterator<Item = (ContentKey, Content)>>(iter: I) -> Self {
        let mut list = KeyList::new();
        for (key, content) in iter {
            list.insert(key, &content);
        }
        list
    }
}

// ---------------------------------------------------------------------------
// Global state
// ---------------------------------------------------------------------------

/// The live global value of one content id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalState {
    pub content_id: ContentId,
    pub value: Value,
    /// The commit that last wrote this value.
    pub last_commit: CommitHash,
}
