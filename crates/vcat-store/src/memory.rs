use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use tracing::debug;
use vcat_crypto::HashLinked;
use vcat_types::{CommitHash, ContentId};

use crate::error::{StoreError, StoreResult};
use crate::log::{CommitLogEntry, GlobalState};
use crate::traits::{CommitLog, GlobalStateStore, GlobalStateTxn};

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(format!("lock poisoned: {e}"))
}

// ---------------------------------------------------------------------------
// Commit log
// ---------------------------------------------------------------------------

/// In-memory, HashMap-based commit log.
///
/// Intended for tests and embedding. Entries are shared as `Arc`s, so reads
/// never copy commit contents.
#[derive(Default)]
pub struct InMemoryCommitLog {
    entries: RwLock<HashMap<CommitHash, Arc<CommitLogEntry>>>,
}

impl InMemoryCommitLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    /// Returns `true` if the log is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl CommitLog for InMemoryCommitLog {
    fn read(&self, hash: &CommitHash) -> StoreResult<Option<Arc<CommitLogEntry>>> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.get(hash).cloned())
    }

    fn write(&self, entry: CommitLogEntry) -> StoreResult<Arc<CommitLogEntry>> {
        let computed = entry.recompute_hash()?;
        if computed != entry.hash {
            return Err(StoreError::HashMismatch {
                claimed: entry.hash,
                computed,
            });
        }
        if entry.hash.is_no_ancestor() {
            return Err(StoreError::CorruptEntry {
                hash: entry.hash,
                reason: "the empty-history hash cannot be stored".into(),
            });
        }

        let mut map = self.entries.write().map_err(poisoned)?;
        if let Some(existing) = map.get(&entry.hash) {
            return Ok(Arc::clone(existing));
        }
        let hash = entry.hash;
        let stored = Arc::new(entry);
        map.insert(hash, Arc::clone(&stored));
        debug!(hash = %hash.short_hex(), seq = stored.commit_seq, "commit stored");
        Ok(stored)
    }

    fn exists(&self, hash: &CommitHash) -> StoreResult<bool> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryCommitLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryCommitLog")
            .field("commit_count", &count)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Global state
// ---------------------------------------------------------------------------

/// In-memory global-state store. A transaction holds the write lock.
#[derive(Debug, Default)]
pub struct InMemoryGlobalStateStore {
    states: RwLock<HashMap<ContentId, GlobalState>>,
}

impl InMemoryGlobalStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

struct InMemoryGlobalStateTxn<'a> {
    guard: RwLockWriteGuard<'a, HashMap<ContentId, GlobalState>>,
}

impl GlobalStateTxn for InMemoryGlobalStateTxn<'_> {
    fn get(&self, id: &ContentId) -> Option<&GlobalState> {
        self.guard.get(id)
    }

    fn put(&mut self, state: GlobalState) {
        self.guard.insert(state.content_id.clone(), state);
    }
}

impl GlobalStateStore for InMemoryGlobalStateStore {
    fn read(&self, id: &ContentId) -> StoreResult<Option<GlobalState>> {
        let map = self.states.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn read_many(&self, ids: &[ContentId]) -> StoreResult<HashMap<ContentId, GlobalState>> {
        let map = self.states.read().map_err(poisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| map.get(id).map(|state| (id.clone(), state.clone())))
            .collect())
    }

    fn begin(&self) -> StoreResult<Box<dyn GlobalStateTxn + '_>> {
        let guard = self.states.write().map_err(poisoned)?;
        Ok(Box::new(InMemoryGlobalStateTxn { guard }))
    }
}
