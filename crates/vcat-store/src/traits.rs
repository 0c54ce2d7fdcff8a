use std::collections::HashMap;
use std::sync::Arc;

use vcat_types::{CommitHash, ContentId};

use crate::error::StoreResult;
use crate::log::{CommitLogEntry, GlobalState};

/// Hash-addressed store of immutable commits.
///
/// All implementations must satisfy these invariants:
/// - Entries are immutable once written. The same content always produces
///   the same hash, so rewriting an existing entry is a no-op.
/// - Write-then-link: `write` verifies the entry's hash before returning.
/// - Concurrent reads are always safe.
pub trait CommitLog: Send + Sync {
    /// Read a commit by hash.
    ///
    /// Returns `Ok(None)` if the commit does not exist.
    fn read(&self, hash: &CommitHash) -> StoreResult<Option<Arc<CommitLogEntry>>>;

    /// Persist a commit and return the stored entry.
    ///
    /// If an entry with the same hash exists, the stored one is returned
    /// unchanged (idempotent).
    fn write(&self, entry: CommitLogEntry) -> StoreResult<Arc<CommitLogEntry>>;

    /// Check whether a commit exists.
    fn exists(&self, hash: &CommitHash) -> StoreResult<bool> {
        Ok(self.read(hash)?.is_some())
    }
}

/// Store of the single live global value per content id.
pub trait GlobalStateStore: Send + Sync {
    /// Read the current global value of `id`.
    fn read(&self, id: &ContentId) -> StoreResult<Option<GlobalState>>;

    /// Read several global values at once. Absent ids are omitted.
    ///
    /// Default implementation calls `read()` for each id. Backends may
    /// override for better performance.
    fn read_many(&self, ids: &[ContentId]) -> StoreResult<HashMap<ContentId, GlobalState>> {
        let mut found = HashMap::new();
        for id in ids {
            if let Some(state) = self.read(id)? {
                found.insert(id.clone(), state);
            }
        }
        Ok(found)
    }

    /// Start an exclusive transaction.
    ///
    /// No other transaction or read observes the store until the returned
    /// handle is dropped, so checks and writes made through it are atomic
    /// with anything else done while it is held.
    fn begin(&self) -> StoreResult<Box<dyn GlobalStateTxn + '_>>;
}

/// Exclusive access to a [`GlobalStateStore`].
pub trait GlobalStateTxn {
    fn get(&self, id: &ContentId) -> Option<&GlobalState>;

    /// Replace the global value of `state.content_id`. Visible to every
    /// reader as soon as the transaction is dropped.
    fn put(&mut self, state: GlobalState);
}
