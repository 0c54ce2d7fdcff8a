//! Commit preparation: operation validation and global-state planning.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use vcat_store::{CommitLog, CommitLogEntry, GlobalState, GlobalStateStore, GlobalStateTxn, KeyList};
use vcat_types::{CommitHash, ContentId, ContentKey, Operation};

use crate::error::{AdapterError, AdapterResult};
use crate::walk::LiveKeys;

/// Reject commits in which two operations target the same key.
pub fn check_distinct_keys(operations: &[Operation]) -> AdapterResult<()> {
    let mut keys = HashSet::with_capacity(operations.len());
    for op in operations {
        if !keys.insert(op.key()) {
            return Err(AdapterError::DuplicateKey(op.key().clone()));
        }
    }
    Ok(())
}

/// Global-state changes carried by one commit.
#[derive(Debug, Default)]
pub struct GlobalPlan {
    /// New global values by content id. The last Put for an id wins.
    updates: BTreeMap<ContentId, Value>,
    /// Puts that rely on an existing global value.
    carried: Vec<(ContentKey, ContentId)>,
}

impl GlobalPlan {
    pub fn from_operations(operations: &[Operation]) -> Self {
        let mut plan = Self::default();
        for op in operations {
            let Operation::Put { key, content } = op else {
                continue;
            };
            if !content.has_global_state() {
                continue;
            }
            match content.global() {
                Some(value) => {
                    plan.updates.insert(content.id().clone(), value.clone());
                }
                None => plan.carried.push((key.clone(), content.id().clone())),
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.carried.is_empty()
    }

    /// Fail with `MissingGlobalState` if a carried-over global value exists
    /// neither in the store nor in this commit.
    ///
    /// Global values are never removed, so a passing check stays valid.
    pub fn check(&self, store: &dyn GlobalStateStore) -> AdapterResult<()> {
        let wanted: Vec<ContentId> = self
            .carried
            .iter()
            .filter(|(_, id)| !self.updates.contains_key(id))
            .map(|(_, id)| id.clone())
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }
        let existing = store.read_many(&wanted)?;
        for (key, id) in &self.carried {
            if !self.updates.contains_key(id) && !existing.contains_key(id) {
                return Err(AdapterError::MissingGlobalState {
                    key: key.clone(),
                    content_id: id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Write every new global value, attributing it to `commit`.
    pub fn apply(self, txn: &mut dyn GlobalStateTxn, commit: CommitHash) {
        for (content_id, value) in self.updates {
            txn.put(GlobalState {
                content_id,
                value,
                last_commit: commit,
            });
        }
    }
}

/// Sequence number of the commit following `parent`.
pub fn next_seq(log: &dyn CommitLog, parent: CommitHash) -> AdapterResult<u64> {
    if parent.is_no_ancestor() {
        return Ok(1);
    }
    let entry = log
        .read(&parent)?
        .ok_or_else(|| AdapterError::missing_commit(&parent))?;
    Ok(entry.commit_seq + 1)
}

/// Build the commit that applies `operations` on top of `parent`.
///
/// Every `key_list_distance`-th commit gets a key list holding the full key
/// space after `operations`.
pub fn build_entry(
    log: &dyn CommitLog,
    parent: CommitHash,
    operations: Vec<Operation>,
    meta: vcat_types::CommitMeta,
    key_list_distance: u64,
) -> AdapterResult<CommitLogEntry> {
    let seq = next_seq(log, parent)?;
    let remainder = seq
        .checked_rem(key_list_distance)
        .ok_or_else(|| AdapterError::InvalidConfig("key_list_distance must be at least 1".into()))?;
    let key_list = if remainder == 0 {
        Some(Arc::new(build_key_list(log, parent, &operations)?))
    } else {
        None
    };
    let parent = (!parent.is_no_ancestor()).then_some(parent);
    Ok(CommitLogEntry::new(parent, seq, meta, operations, key_list)?)
}

fn build_key_list(
    log: &dyn CommitLog,
    parent: CommitHash,
    operations: &[Operation],
) -> AdapterResult<KeyList> {
    let mut list = KeyList::new();
    for entry in LiveKeys::new(log, parent) {
        let entry = entry?;
        list.insert(entry.key, &entry.content);
    }
    for op in operations {
        match op {
            Operation::Put { key, content } => list.insert(key.clone(), content),
            Operation::Delete { key } => {
                list.remove(key);
            }
            Operation::Unchanged { .. } => {}
        }
    }
    Ok(list)
}

/// Returns `true` if `hash` names a stored commit or the empty history.
pub fn resolves(log: &dyn CommitLog, hash: &CommitHash) -> AdapterResult<bool> {
    Ok(hash.is_no_ancestor() || log.exists(hash)?)
}

/// Verify `hash` resolves, otherwise `ReferenceNotFound`.
pub fn require_commit(log: &dyn CommitLog, hash: &CommitHash) -> AdapterResult<()> {
    if resolves(log, hash)? {
        Ok(())
    } else {
        Err(AdapterError::hash_not_found(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::CommitLogIter;
    use serde_json::json;
    use vcat_store::{GlobalStateStore, InMemoryCommitLog, InMemoryGlobalStateStore};
    use vcat_types::{CommitMeta, Content, ContentType};

    fn key(path: &str) -> ContentKey {
        ContentKey::from_path_string(path).unwrap()
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let ops = vec![
            Operation::put(key("a.t"), Content::sql_view("select 1", "SPARK")),
            Operation::delete(key("a.t")),
        ];
        match check_distinct_keys(&ops) {
            Err(AdapterError::DuplicateKey(k)) => assert_eq!(k, key("a.t")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn distinct_keys_pass() {
        let ops = vec![
            Operation::delete(key("a")),
            Operation::unchanged(key("b")),
        ];
        assert!(check_distinct_keys(&ops).is_ok());
    }

    #[test]
    fn plan_ignores_simple_content() {
        let ops = vec![Operation::put(key("v"), Content::sql_view("select 1", "SPARK"))];
        assert!(GlobalPlan::from_operations(&ops).is_empty());
    }

    #[test]
    fn carried_global_requires_existing_value() {
        let id = ContentId::new("t1");
        let carried = Content::with_global(id, ContentType::IcebergTable, json!({}), None);
        let plan = GlobalPlan::from_operations(&[Operation::put(key("t"), carried)]);

        let store = InMemoryGlobalStateStore::new();
        assert!(matches!(
            plan.check(&store),
            Err(AdapterError::MissingGlobalState { .. })
        ));
    }

    #[test]
    fn global_supplied_by_sibling_put_satisfies_check() {
        let id = ContentId::new("t1");
        let ops = vec![
            Operation::put(
                key("t"),
                Content::with_global(id.clone(), ContentType::IcebergTable, json!({}), None),
            ),
            Operation::put(
                key("t_alias"),
                Content::with_global(id, ContentType::IcebergTable, json!({}), Some(json!("g"))),
            ),
        ];
        let plan = GlobalPlan::from_operations(&ops);
        let store = InMemoryGlobalStateStore::new();
        assert!(plan.check(&store).is_ok());
        let mut txn = store.begin().unwrap();
        plan.apply(txn.as_mut(), CommitHash::from_hash([1; 32]));
        drop(txn);
        assert_eq!(
            store.read(&ContentId::new("t1")).unwrap().unwrap().value,
            json!("g")
        );
    }

    #[test]
    fn every_nth_commit_carries_a_key_list() {
        let log = InMemoryCommitLog::new();
        let mut head = CommitHash::NO_ANCESTOR;
        for i in 0..4 {
            let ops = vec![Operation::put(
                key(&format!("t{i}")),
                Content::sql_view("select 1", "SPARK"),
            )];
            let entry =
                build_entry(&log, head, ops, CommitMeta::from_message("c"), 2).unwrap();
            assert_eq!(entry.commit_seq, i + 1);
            assert_eq!(entry.key_list.is_some(), (i + 1) % 2 == 0);
            head = log.write(entry).unwrap().hash;
        }
        let last = log.read(&head).unwrap().unwrap();
        assert_eq!(last.key_list.as_ref().unwrap().len(), 4);
        assert_eq!(CommitLogIter::new(&log, head).count(), 4);
    }

    #[test]
    fn zero_key_list_distance_is_an_error() {
        let log = InMemoryCommitLog::new();
        let err = build_entry(
            &log,
            CommitHash::NO_ANCESTOR,
            Vec::new(),
            CommitMeta::from_message("c"),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_hash_does_not_resolve() {
        let log = InMemoryCommitLog::new();
        assert!(require_commit(&log, &CommitHash::NO_ANCESTOR).is_ok());
        assert!(matches!(
            require_commit(&log, &CommitHash::from_hash([3; 32])),
            Err(AdapterError::ReferenceNotFound(_))
        ));
    }
}
