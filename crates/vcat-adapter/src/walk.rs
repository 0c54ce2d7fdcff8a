//! Lazy traversals over the commit log.
//!
//! Histories are linear chains (one parent per commit), so every walk is a
//! single pass from a head back towards [`CommitHash::NO_ANCESTOR`].

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use vcat_store::{CommitLog, CommitLogEntry};
use vcat_types::{CommitHash, Content, ContentKey, Entry, Operation};

use crate::error::{AdapterError, AdapterResult};

// ---------------------------------------------------------------------------
// Commit log iteration
// ---------------------------------------------------------------------------

/// Commits from a head back to the root, newest first.
pub struct CommitLogIter<'a> {
    log: &'a dyn CommitLog,
    next: Option<CommitHash>,
}

impl<'a> CommitLogIter<'a> {
    pub fn new(log: &'a dyn CommitLog, head: CommitHash) -> Self {
        Self {
            log,
            next: Some(head),
        }
    }
}

impl Iterator for CommitLogIter<'_> {
    type Item = AdapterResult<Arc<CommitLogEntry>>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.next.take()?;
        if hash.is_no_ancestor() {
            return None;
        }
        match self.log.read(&hash) {
            Ok(Some(entry)) => {
                self.next = entry.parent;
                Some(Ok(entry))
            }
            Ok(None) => Some(Err(AdapterError::missing_commit(&hash))),
            Err(e) => Some(Err(e.into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Key-space resolution
// ---------------------------------------------------------------------------

/// One live key with its on-reference content (global state stripped).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyListEntry {
    pub key: ContentKey,
    pub content: Content,
}

impl KeyListEntry {
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.key.clone(), self.content.content_type())
    }
}

/// Every key live at a commit, discovered newest-first.
///
/// Commits are read one at a time as the iterator is driven. A Put or
/// Delete shadows every older operation on the same key. The walk stops at
/// the first commit carrying a key list, which already holds the full key
/// space as of that commit.
pub struct LiveKeys<'a> {
    commits: CommitLogIter<'a>,
    seen: HashSet<ContentKey>,
    pending: VecDeque<KeyListEntry>,
    exhausted: bool,
}

impl<'a> LiveKeys<'a> {
    pub fn new(log: &'a dyn CommitLog, at: CommitHash) -> Self {
        Self {
            commits: CommitLogIter::new(log, at),
            seen: HashSet::new(),
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    fn absorb(&mut self, commit: &CommitLogEntry) {
        if let Some(key_list) = &commit.key_list {
            for (key, content) in key_list.iter() {
                if self.seen.insert(key.clone()) {
                    self.pending.push_back(KeyListEntry {
                        key: key.clone(),
                        content: content.clone(),
                    });
                }
            }
            self.exhausted = true;
            return;
        }
        for op in &commit.operations {
            match op {
                Operation::Put { key, content } => {
                    if self.seen.insert(key.clone()) {
                        self.pending.push_back(KeyListEntry {
                            key: key.clone(),
                            content: content.without_global(),
                        });
                    }
                }
                Operation::Delete { key } => {
                    self.seen.insert(key.clone());
                }
                Operation::Unchanged { .. } => {}
            }
        }
    }
}

impl Iterator for LiveKeys<'_> {
    type Item = AdapterResult<KeyListEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Some(Ok(entry));
            }
            if self.exhausted {
                return None;
            }
            match self.commits.next() {
                Some(Ok(commit)) => self.absorb(&commit),
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
                None => self.exhausted = true,
            }
        }
    }
}

/// Resolve the on-reference content of `keys` at `at`.
///
/// Stops walking as soon as every key is decided, or at the first key list.
pub fn resolve_keys(
    log: &dyn CommitLog,
    at: CommitHash,
    keys: &[ContentKey],
) -> AdapterResult<BTreeMap<ContentKey, Content>> {
    let mut open: BTreeSet<&ContentKey> = keys.iter().collect();
    let mut found = BTreeMap::new();

    for commit in CommitLogIter::new(log, at) {
        if open.is_empty() {
            break;
        }
        let commit = commit?;
        if let Some(key_list) = &commit.key_list {
            for key in open.iter() {
                if let Some(content) = key_list.get(key) {
                    found.insert((*key).clone(), content.clone());
                }
            }
            return Ok(found);
        }
        for op in &commit.operations {
            match op {
                Operation::Put { key, content } => {
                    if open.remove(key) {
                        found.insert(key.clone(), content.without_global());
                    }
                }
                Operation::Delete { key } => {
                    open.remove(key);
                }
                Operation::Unchanged { .. } => {}
            }
        }
    }
    Ok(found)
}

// ---------------------------------------------------------------------------
// Ancestry
// ---------------------------------------------------------------------------

/// Returns `true` if `candidate` is `head` or one of its ancestors.
pub fn is_ancestor(
    log: &dyn CommitLog,
    candidate: CommitHash,
    head: CommitHash,
) -> AdapterResult<bool> {
    if candidate.is_no_ancestor() || candidate == head {
        return Ok(true);
    }
    for commit in CommitLogIter::new(log, head) {
        if commit?.hash == candidate {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The nearest commit reachable from both `a` and `b`.
///
/// Returns [`CommitHash::NO_ANCESTOR`] when the histories share no commit.
pub fn common_ancestor(
    log: &dyn CommitLog,
    a: CommitHash,
    b: CommitHash,
) -> AdapterResult<CommitHash> {
    if a == b {
        return Ok(a);
    }
    let mut ancestors_a = HashSet::new();
    for commit in CommitLogIter::new(log, a) {
        ancestors_a.insert(commit?.hash);
    }
    for commit in CommitLogIter::new(log, b) {
        let commit = commit?;
        if ancestors_a.contains(&commit.hash) {
            return Ok(commit.hash);
        }
    }
    Ok(CommitHash::NO_ANCESTOR)
}

/// Commits after `ancestor` up to and including `head`, newest first.
///
/// `ancestor` must be reachable from `head` (or be `NO_ANCESTOR`).
pub fn commits_since(
    log: &dyn CommitLog,
    head: CommitHash,
    ancestor: CommitHash,
) -> AdapterResult<Vec<Arc<CommitLogEntry>>> {
    let mut commits = Vec::new();
    for commit in CommitLogIter::new(log, head) {
        let commit = commit?;
        if commit.hash == ancestor {
            break;
        }
        commits.push(commit);
    }
    Ok(commits)
}

/// Keys modified by any of `commits`.
pub fn modified_keys<'c>(
    commits: impl IntoIterator<Item = &'c Arc<CommitLogEntry>>,
) -> BTreeSet<ContentKey> {
    commits
        .into_iter()
        .flat_map(|commit| commit.modified_keys().cloned().collect::<Vec<_>>())
        .collect()
}
