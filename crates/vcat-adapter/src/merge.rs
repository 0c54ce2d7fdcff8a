//! Replaying commits from one history onto another.
//!
//! Merge and transplant both rewrite source commits on top of the target
//! head. A replayed Put carries only on-reference state: the global value
//! it once wrote is already live and must not be rewound.

use std::collections::HashSet;
use std::sync::Arc;

use vcat_store::{CommitLog, CommitLogEntry};
use vcat_types::{CommitHash, Operation};

use crate::commit::build_entry;
use crate::error::{AdapterError, AdapterResult};
use crate::walk::{commits_since, common_ancestor, modified_keys};

/// Commits on `from` that `head` lacks, oldest first, and the common
/// ancestor they start from.
///
/// Returns `None` when `head` already contains `from`.
pub fn merge_source(
    log: &dyn CommitLog,
    from: CommitHash,
    head: CommitHash,
) -> AdapterResult<Option<(CommitHash, Vec<Arc<CommitLogEntry>>)>> {
    let ancestor = common_ancestor(log, from, head)?;
    if ancestor == from {
        return Ok(None);
    }
    let mut source = commits_since(log, from, ancestor)?;
    source.reverse();
    Ok(Some((ancestor, source)))
}

/// The commits of `source` still to be replayed onto `head`.
///
/// A source commit whose copy is already on `head` since `ancestor` is
/// skipped. The remaining commits fail with `KeyConflict` if they modify a
/// key that `head` also modified since `ancestor`; copies of source commits
/// do not count as modifications on `head`.
pub fn pending_commits(
    log: &dyn CommitLog,
    reference: &str,
    head: CommitHash,
    ancestor: CommitHash,
    source: Vec<Arc<CommitLogEntry>>,
) -> AdapterResult<Vec<Arc<CommitLogEntry>>> {
    let target_commits = commits_since(log, head, ancestor)?;
    let replayed: HashSet<CommitHash> = target_commits
        .iter()
        .filter_map(|commit| commit.replay_of)
        .collect();
    let source_hashes: HashSet<CommitHash> = source.iter().map(|commit| commit.hash).collect();

    let pending: Vec<_> = source
        .into_iter()
        .filter(|commit| !replayed.contains(&commit.hash))
        .collect();
    let target_keys = modified_keys(target_commits.iter().filter(|commit| {
        commit
            .replay_of
            .map_or(true, |origin| !source_hashes.contains(&origin))
    }));
    let source_keys = modified_keys(&pending);

    let conflicts: Vec<_> = source_keys.intersection(&target_keys).cloned().collect();
    if conflicts.is_empty() {
        Ok(pending)
    } else {
        Err(AdapterError::KeyConflict {
            reference: reference.to_string(),
            keys: conflicts,
        })
    }
}

/// Write copies of `source` chained onto `onto`; returns the last hash.
pub fn replay(
    log: &dyn CommitLog,
    onto: CommitHash,
    source: &[Arc<CommitLogEntry>],
    key_list_distance: u64,
) -> AdapterResult<CommitHash> {
    let mut parent = onto;
    for commit in source {
        let operations = commit
            .operations
            .iter()
            .map(|op| match op {
                Operation::Put { key, content } => Operation::put(key.clone(), content.without_global()),
                other => other.clone(),
            })
            .collect();
        let entry = build_entry(
            log,
            parent,
            operations,
            commit.meta.clone(),
            key_list_distance,
        )?
        .with_replay_of(commit.hash)?;
        parent = log.write(entry)?.hash;
    }
    Ok(parent)
}
