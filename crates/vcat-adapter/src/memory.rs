//! In-memory database adapter.
//!
//! [`InMemoryDatabaseAdapter`] composes an [`InMemoryRefStore`], an
//! [`InMemoryCommitLog`] and an [`InMemoryGlobalStateStore`]. Nothing is
//! shared between instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use vcat_refs::{InMemoryRefStore, NamedRef, RefError, RefStore, Reference};
use vcat_store::{
    CommitLog, CommitLogEntry, GlobalStateStore, InMemoryCommitLog, InMemoryGlobalStateStore,
};
use vcat_types::{CommitHash, CommitMeta, Content, ContentId, ContentKey, Operation};

use crate::commit::{build_entry, check_distinct_keys, require_commit, GlobalPlan};
use crate::config::AdapterConfig;
use crate::diff::{diff_key_spaces, Difference};
use crate::error::{AdapterError, AdapterResult};
use crate::merge::{merge_source, pending_commits, replay};
use crate::traits::{AdapterIter, DatabaseAdapter};
use crate::walk::{common_ancestor, is_ancestor, resolve_keys, CommitLogIter, KeyListEntry, LiveKeys};

/// A [`DatabaseAdapter`] backed entirely by process memory.
#[derive(Debug)]
pub struct InMemoryDatabaseAdapter {
    config: AdapterConfig,
    refs: InMemoryRefStore,
    log: InMemoryCommitLog,
    globals: InMemoryGlobalStateStore,
}

impl InMemoryDatabaseAdapter {
    /// Create an empty adapter. Call
    /// [`initialize_repo`](DatabaseAdapter::initialize_repo) before use.
    ///
    /// Fails with `InvalidConfig` if `config` does not validate.
    pub fn new(config: AdapterConfig) -> AdapterResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            refs: InMemoryRefStore::new(),
            log: InMemoryCommitLog::new(),
            globals: InMemoryGlobalStateStore::new(),
        })
    }

    fn branch_head(&self, branch: &str) -> AdapterResult<CommitHash> {
        self.refs
            .read_named(&NamedRef::branch(branch))?
            .map(|reference| reference.hash())
            .ok_or_else(|| AdapterError::ReferenceNotFound(branch.to_string()))
    }

    /// Fail fast before doing any work for a stale `expected`. The final
    /// compare-and-swap is still authoritative.
    fn check_head(&self, branch: &str, expected: CommitHash) -> AdapterResult<()> {
        let actual = self.branch_head(branch)?;
        if actual != expected {
            debug!(branch, expected = %expected.short_hex(), actual = %actual.short_hex(), "stale expected hash");
            return Err(AdapterError::ReferenceConflict {
                reference: branch.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn advance(&self, branch: &str, expected: CommitHash, new: CommitHash) -> AdapterResult<()> {
        self.refs
            .compare_and_swap(&NamedRef::branch(branch), &expected, &new)
            .map_err(|e| {
                if let RefError::Conflict { actual, .. } = &e {
                    debug!(branch, actual = %actual.short_hex(), "lost compare-and-swap");
                }
                AdapterError::from(e)
            })?;
        Ok(())
    }

    fn attach_globals(
        &self,
        values: BTreeMap<ContentKey, Content>,
    ) -> AdapterResult<BTreeMap<ContentKey, Content>> {
        let ids: Vec<ContentId> = values
            .values()
            .filter(|content| content.has_global_state())
            .map(|content| content.id().clone())
            .collect();
        if ids.is_empty() {
            return Ok(values);
        }
        let globals = self.globals.read_many(&ids)?;
        Ok(values
            .into_iter()
            .map(|(key, content)| {
                let content = if content.has_global_state() {
                    let global = globals.get(content.id()).map(|state| state.value.clone());
                    content.with_global_value(global)
                } else {
                    content
                };
                (key, content)
            })
            .collect())
    }

    fn key_space(&self, at: CommitHash) -> AdapterResult<BTreeMap<ContentKey, Content>> {
        let values = LiveKeys::new(&self.log, at)
            .map(|entry| entry.map(|entry| (entry.key, entry.content)))
            .collect::<AdapterResult<BTreeMap<_, _>>>()?;
        self.attach_globals(values)
    }

    fn write_commit(
        &self,
        parent: CommitHash,
        operations: Vec<Operation>,
        meta: CommitMeta,
    ) -> AdapterResult<CommitHash> {
        let entry = build_entry(
            &self.log,
            parent,
            operations,
            meta,
            self.config.key_list_distance,
        )?;
        Ok(self.log.write(entry)?.hash)
    }
}

impl DatabaseAdapter for InMemoryDatabaseAdapter {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn initialize_repo(&self, default_branch: &str) -> AdapterResult<()> {
        if !self.refs.list_refs()?.is_empty() {
            return Ok(());
        }
        let reference = Reference::new(&NamedRef::branch(default_branch), CommitHash::NO_ANCESTOR);
        match self.refs.create_ref(&reference) {
            Ok(()) => {
                info!(branch = default_branch, "repository initialized");
                Ok(())
            }
            Err(RefError::AlreadyExists { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn hash_on_reference(
        &self,
        name: &str,
        hash: Option<CommitHash>,
    ) -> AdapterResult<CommitHash> {
        let head = self.get_reference(name)?.hash();
        match hash {
            None => Ok(head),
            Some(hash) if is_ancestor(&self.log, hash, head)? => Ok(hash),
            Some(hash) => Err(AdapterError::ReferenceNotFound(format!(
                "commit {hash} on reference {name}"
            ))),
        }
    }

    fn get_reference(&self, name: &str) -> AdapterResult<Reference> {
        self.refs
            .read_ref(name)?
            .ok_or_else(|| AdapterError::ReferenceNotFound(name.to_string()))
    }

    fn named_refs(&self) -> AdapterResult<Vec<Reference>> {
        Ok(self.refs.list_refs()?)
    }

    fn create_reference(&self, named: &NamedRef, from: CommitHash) -> AdapterResult<Reference> {
        require_commit(&self.log, &from)?;
        let reference = Reference::new(named, from);
        self.refs.create_ref(&reference)?;
        info!(reference = %named, hash = %from.short_hex(), "reference created");
        Ok(reference)
    }

    fn delete_reference(&self, named: &NamedRef, expected: CommitHash) -> AdapterResult<()> {
        self.refs.delete_ref(named, &expected)?;
        info!(reference = %named, hash = %expected.short_hex(), "reference deleted");
        Ok(())
    }

    fn assign(
        &self,
        named: &NamedRef,
        expected: CommitHash,
        to: CommitHash,
    ) -> AdapterResult<Reference> {
        require_commit(&self.log, &to)?;
        let reference = self.refs.compare_and_swap(named, &expected, &to)?;
        info!(reference = %named, from = %expected.short_hex(), to = %to.short_hex(), "reference assigned");
        Ok(reference)
    }

    fn commit(
        &self,
        branch: &str,
        expected: CommitHash,
        operations: Vec<Operation>,
        mut meta: CommitMeta,
    ) -> AdapterResult<CommitHash> {
        check_distinct_keys(&operations)?;
        self.check_head(branch, expected)?;
        if meta.commit_time.is_none() {
            meta.commit_time = Some(Utc::now());
        }

        let ops = operations.len();
        let plan = GlobalPlan::from_operations(&operations);
        plan.check(&self.globals)?;
        let hash = self.write_commit(expected, operations, meta)?;
        if plan.is_empty() {
            self.advance(branch, expected, hash)?;
        } else {
            // Only the branch CAS and the global writes run inside the
            // transaction.
            let mut txn = self.globals.begin()?;
            self.advance(branch, expected, hash)?;
            plan.apply(&mut *txn, hash);
        }

        info!(branch, hash = %hash.short_hex(), ops, "committed");
        Ok(hash)
    }

    fn commit_log(
        &self,
        head: CommitHash,
    ) -> AdapterResult<AdapterIter<'_, Arc<CommitLogEntry>>> {
        require_commit(&self.log, &head)?;
        Ok(Box::new(CommitLogIter::new(&self.log, head)))
    }

    fn keys(&self, at: CommitHash) -> AdapterResult<AdapterIter<'_, KeyListEntry>> {
        require_commit(&self.log, &at)?;
        Ok(Box::new(LiveKeys::new(&self.log, at)))
    }

    fn get_values(
        &self,
        at: CommitHash,
        keys: &[ContentKey],
    ) -> AdapterResult<BTreeMap<ContentKey, Content>> {
        require_commit(&self.log, &at)?;
        let values = resolve_keys(&self.log, at, keys)?;
        self.attach_globals(values)
    }

    fn diff(&self, from: CommitHash, to: CommitHash) -> AdapterResult<Vec<Difference>> {
        require_commit(&self.log, &from)?;
        require_commit(&self.log, &to)?;
        Ok(diff_key_spaces(&self.key_space(from)?, &self.key_space(to)?))
    }

    fn merge(
        &self,
        from: CommitHash,
        to_branch: &str,
        expected: CommitHash,
    ) -> AdapterResult<CommitHash> {
        require_commit(&self.log, &from)?;
        self.check_head(to_branch, expected)?;

        let source = match merge_source(&self.log, from, expected)? {
            Some((ancestor, source)) => {
                pending_commits(&self.log, to_branch, expected, ancestor, source)?
            }
            None => Vec::new(),
        };
        if source.is_empty() {
            debug!(branch = to_branch, from = %from.short_hex(), "nothing to merge");
            return Ok(expected);
        }
        let head = replay(&self.log, expected, &source, self.config.key_list_distance)?;
        self.advance(to_branch, expected, head)?;

        info!(
            branch = to_branch,
            from = %from.short_hex(),
            hash = %head.short_hex(),
            commits = source.len(),
            "merged"
        );
        Ok(head)
    }

    fn transplant(
        &self,
        to_branch: &str,
        expected: CommitHash,
        commits: &[CommitHash],
    ) -> AdapterResult<CommitHash> {
        self.check_head(to_branch, expected)?;

        let mut source = Vec::with_capacity(commits.len());
        for hash in commits {
            let entry = self
                .log
                .read(hash)?
                .ok_or_else(|| AdapterError::hash_not_found(hash))?;
            source.push(entry);
        }
        let Some(first) = source.first() else {
            return Ok(expected);
        };

        let ancestor = common_ancestor(&self.log, first.parent_or_no_ancestor(), expected)?;
        let source = pending_commits(&self.log, to_branch, expected, ancestor, source)?;
        if source.is_empty() {
            return Ok(expected);
        }
        let head = replay(&self.log, expected, &source, self.config.key_list_distance)?;
        self.advance(to_branch, expected, head)?;

        info!(
            branch = to_branch,
            hash = %head.short_hex(),
            commits = source.len(),
            "transplanted"
        );
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{BTreeSet, HashSet};
    use vcat_crypto::HistoryVerifier;
    use vcat_types::{ContentType, Entry};

    fn adapter() -> InMemoryDatabaseAdapter {
        adapter_with(AdapterConfig::default())
    }

    fn adapter_with(config: AdapterConfig) -> InMemoryDatabaseAdapter {
        let adapter = InMemoryDatabaseAdapter::new(config).unwrap();
        adapter.initialize_repo("main").unwrap();
        adapter
    }

    fn key(path: &str) -> ContentKey {
        ContentKey::from_path_string(path).unwrap()
    }

    fn view(sql: &str) -> Content {
        Content::sql_view(sql, "SPARK")
    }

    fn head(adapter: &InMemoryDatabaseAdapter, name: &str) -> CommitHash {
        adapter.get_reference(name).unwrap().hash()
    }

    fn commit(
        adapter: &InMemoryDatabaseAdapter,
        branch: &str,
        ops: Vec<Operation>,
    ) -> CommitHash {
        let expected = head(adapter, branch);
        adapter
            .commit(branch, expected, ops, CommitMeta::from_message("test"))
            .unwrap()
    }

    fn entries(adapter: &InMemoryDatabaseAdapter, at: CommitHash) -> HashSet<Entry> {
        adapter
            .get_entries(at)
            .unwrap()
            .collect::<AdapterResult<_>>()
            .unwrap()
    }

    fn global_of(adapter: &InMemoryDatabaseAdapter, branch: &str, k: &str) -> Option<serde_json::Value> {
        let at = head(adapter, branch);
        adapter.get_values(at, &[key(k)]).unwrap()[&key(k)]
            .global()
            .cloned()
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn zero_key_list_distance_is_rejected_up_front() {
        let config = AdapterConfig::default().with_key_list_distance(0);
        let err = InMemoryDatabaseAdapter::new(config).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidConfig(_)));
    }

    #[test]
    fn initialize_creates_default_branch_once() {
        let adapter = adapter();
        adapter.initialize_repo("other").unwrap();
        let refs = adapter.named_refs().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name(), "main");
        assert_eq!(refs[0].hash(), adapter.no_ancestor_hash());
    }

    #[test]
    fn create_reference_at_existing_commit() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        let tag = adapter.create_reference(&NamedRef::tag("v1"), c1).unwrap();
        assert!(tag.is_tag());
        assert_eq!(adapter.get_reference("v1").unwrap().hash(), c1);
    }

    #[test]
    fn create_reference_rejects_taken_name_across_kinds() {
        let adapter = adapter();
        let err = adapter
            .create_reference(&NamedRef::tag("main"), CommitHash::NO_ANCESTOR)
            .unwrap_err();
        assert!(matches!(err, AdapterError::ReferenceAlreadyExists(_)));
    }

    #[test]
    fn create_reference_rejects_unknown_hash() {
        let adapter = adapter();
        let err = adapter
            .create_reference(&NamedRef::branch("dev"), CommitHash::from_hash([7; 32]))
            .unwrap_err();
        assert!(matches!(err, AdapterError::ReferenceNotFound(_)));
        assert!(adapter.get_reference("dev").is_err());
    }

    #[test]
    fn create_reference_rejects_invalid_name() {
        let adapter = adapter();
        let err = adapter
            .create_reference(&NamedRef::branch("bad..name"), CommitHash::NO_ANCESTOR)
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidReferenceName { .. }));
    }

    #[test]
    fn delete_reference_is_compare_and_swap() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::delete(key("a"))]);
        adapter
            .create_reference(&NamedRef::branch("dev"), CommitHash::NO_ANCESTOR)
            .unwrap();

        let err = adapter
            .delete_reference(&NamedRef::branch("dev"), c1)
            .unwrap_err();
        assert!(err.is_conflict());

        adapter
            .delete_reference(&NamedRef::branch("dev"), CommitHash::NO_ANCESTOR)
            .unwrap();
        assert!(matches!(
            adapter.delete_reference(&NamedRef::branch("dev"), CommitHash::NO_ANCESTOR),
            Err(AdapterError::ReferenceNotFound(_))
        ));
    }

    #[test]
    fn assign_moves_tag() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::delete(key("a"))]);
        let c2 = commit(&adapter, "main", vec![Operation::delete(key("b"))]);
        adapter.create_reference(&NamedRef::tag("release"), c1).unwrap();

        let moved = adapter.assign(&NamedRef::tag("release"), c1, c2).unwrap();
        assert_eq!(moved.hash(), c2);
        assert!(adapter
            .assign(&NamedRef::tag("release"), c1, c2)
            .unwrap_err()
            .is_conflict());
        assert!(matches!(
            adapter.assign(&NamedRef::tag("release"), c2, CommitHash::from_hash([4; 32])),
            Err(AdapterError::ReferenceNotFound(_))
        ));
    }

    #[test]
    fn hash_on_reference_accepts_ancestors_only() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::delete(key("a"))]);
        let c2 = commit(&adapter, "main", vec![Operation::delete(key("b"))]);
        adapter
            .create_reference(&NamedRef::branch("dev"), CommitHash::NO_ANCESTOR)
            .unwrap();
        let d1 = commit(&adapter, "dev", vec![Operation::delete(key("c"))]);

        assert_eq!(adapter.hash_on_reference("main", None).unwrap(), c2);
        assert_eq!(adapter.hash_on_reference("main", Some(c1)).unwrap(), c1);
        assert!(matches!(
            adapter.hash_on_reference("main", Some(d1)),
            Err(AdapterError::ReferenceNotFound(_))
        ));
        assert!(matches!(
            adapter.hash_on_reference("nope", None),
            Err(AdapterError::ReferenceNotFound(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    #[test]
    fn commit_advances_branch_and_records_history() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::put(key("a.t"), view("select 1"))]);
        let c2 = commit(&adapter, "main", vec![Operation::put(key("a.u"), view("select 2"))]);
        assert_eq!(head(&adapter, "main"), c2);

        let log: Vec<Arc<CommitLogEntry>> = adapter
            .commit_log(c2)
            .unwrap()
            .collect::<AdapterResult<_>>()
            .unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].hash, c2);
        assert_eq!(log[1].hash, c1);
        assert_eq!(log[0].parent, Some(c1));
        assert!(log[0].meta.commit_time.is_some());
    }

    #[test]
    fn commit_with_stale_hash_conflicts() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::delete(key("a"))]);
        let err = adapter
            .commit(
                "main",
                CommitHash::NO_ANCESTOR,
                vec![Operation::delete(key("b"))],
                CommitMeta::from_message("stale"),
            )
            .unwrap_err();
        match err {
            AdapterError::ReferenceConflict { expected, actual, .. } => {
                assert_eq!(expected, CommitHash::NO_ANCESTOR);
                assert_eq!(actual, c1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(head(&adapter, "main"), c1);
    }

    #[test]
    fn duplicate_key_leaves_head_unchanged() {
        let adapter = adapter();
        let before = head(&adapter, "main");
        let err = adapter
            .commit(
                "main",
                before,
                vec![
                    Operation::put(key("a"), view("select 1")),
                    Operation::put(key("a"), view("select 2")),
                ],
                CommitMeta::from_message("dup"),
            )
            .unwrap_err();
        assert!(matches!(err, AdapterError::DuplicateKey(_)));
        assert!(err.is_retry_safe());
        assert_eq!(head(&adapter, "main"), before);
    }

    #[test]
    fn commit_to_tag_or_unknown_branch_is_not_found() {
        let adapter = adapter();
        adapter
            .create_reference(&NamedRef::tag("v1"), CommitHash::NO_ANCESTOR)
            .unwrap();
        for name in ["v1", "missing"] {
            let err = adapter
                .commit(name, CommitHash::NO_ANCESTOR, vec![], CommitMeta::from_message("m"))
                .unwrap_err();
            assert!(matches!(err, AdapterError::ReferenceNotFound(_)));
        }
    }

    #[test]
    fn deletes_hide_keys_but_history_keeps_them() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        let c2 = commit(&adapter, "main", vec![Operation::delete(key("a"))]);

        assert!(adapter.get_values(c2, &[key("a")]).unwrap().is_empty());
        assert_eq!(adapter.get_values(c1, &[key("a")]).unwrap().len(), 1);
    }

    #[test]
    fn history_is_immutable_and_verifies() {
        let adapter = adapter();
        let c1 = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        let first_read: Vec<CommitLogEntry> = adapter
            .commit_log(c1)
            .unwrap()
            .map(|c| c.map(|c| (*c).clone()))
            .collect::<AdapterResult<_>>()
            .unwrap();
        commit(&adapter, "main", vec![Operation::delete(key("a"))]);
        let c3 = commit(&adapter, "main", vec![Operation::put(key("b"), view("select 2"))]);

        let mut chain: Vec<CommitLogEntry> = adapter
            .commit_log(c3)
            .unwrap()
            .map(|c| c.map(|c| (*c).clone()))
            .collect::<AdapterResult<_>>()
            .unwrap();
        assert_eq!(chain.last(), first_read.first());
        chain.reverse();
        assert!(HistoryVerifier::verify_chain(&chain).is_ok());
    }

    #[test]
    fn table_commits_on_different_branches_all_land() {
        let adapter = adapter();
        let base = head(&adapter, "main");
        let branches: Vec<String> = (0..8).map(|i| format!("b{i}")).collect();
        for name in &branches {
            adapter.create_reference(&NamedRef::branch(name.as_str()), base).unwrap();
        }

        std::thread::scope(|s| {
            for (i, name) in branches.iter().enumerate() {
                let adapter = &adapter;
                s.spawn(move || {
                    let table = Content::with_global(
                        ContentId::new(format!("table-{i}")),
                        ContentType::IcebergTable,
                        json!({"snapshotId": i}),
                        Some(json!(format!("g{i}"))),
                    );
                    adapter
                        .commit(name, base, vec![Operation::put(key("t"), table)], CommitMeta::from_message("m"))
                        .unwrap();
                });
            }
        });

        for (i, name) in branches.iter().enumerate() {
            assert_ne!(head(&adapter, name), base);
            assert_eq!(global_of(&adapter, name, "t"), Some(json!(format!("g{i}"))));
        }
    }

    #[test]
    fn concurrent_commits_have_single_winner() {
        let adapter = adapter();
        let base = head(&adapter, "main");

        let results: Vec<AdapterResult<CommitHash>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let adapter = &adapter;
                    s.spawn(move || {
                        adapter.commit(
                            "main",
                            base,
                            vec![Operation::put(key(&format!("t{i}")), view("select 1"))],
                            CommitMeta::from_message(format!("writer {i}")),
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<CommitHash> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(AdapterError::is_conflict));
        assert_eq!(head(&adapter, "main"), winners[0]);
    }

    #[test]
    fn key_list_checkpoints_do_not_change_listings() {
        let dense = adapter_with(AdapterConfig::default().with_key_list_distance(2));
        let sparse = adapter_with(AdapterConfig::default().with_key_list_distance(1000));

        for adapter in [&dense, &sparse] {
            for i in 0..7 {
                commit(adapter, "main", vec![Operation::put(
                    key(&format!("ns.t{i}")),
                    view("select 1").with_id(ContentId::new(format!("id{i}"))),
                )]);
            }
            commit(adapter, "main", vec![Operation::delete(key("ns.t3"))]);
        }

        let dense_entries = entries(&dense, head(&dense, "main"));
        assert_eq!(dense_entries.len(), 6);
        assert_eq!(dense_entries, entries(&sparse, head(&sparse, "main")));
    }

    // -----------------------------------------------------------------------
    // Global state
    // -----------------------------------------------------------------------

    #[test]
    fn global_state_is_shared_across_branches() {
        let adapter = adapter();
        let id = ContentId::new("table-1");
        let table = Content::with_global(
            id.clone(),
            ContentType::IcebergTable,
            json!({"snapshotId": 1}),
            Some(json!({"metadataLocation": "v1"})),
        );
        let c1 = commit(&adapter, "main", vec![Operation::put(key("db.t"), table)]);
        adapter.create_reference(&NamedRef::branch("dev"), c1).unwrap();

        let update = Content::with_global(
            id,
            ContentType::IcebergTable,
            json!({"snapshotId": 2}),
            Some(json!({"metadataLocation": "v2"})),
        );
        commit(&adapter, "main", vec![Operation::put(key("db.t"), update)]);

        assert_eq!(global_of(&adapter, "dev", "db.t"), Some(json!({"metadataLocation": "v2"})));
        let dev_head = head(&adapter, "dev");
        let on_dev = &adapter.get_values(dev_head, &[key("db.t")]).unwrap()[&key("db.t")];
        match on_dev {
            Content::WithGlobalState { on_ref, .. } => assert_eq!(on_ref, &json!({"snapshotId": 1})),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn put_without_global_carries_current_value() {
        let adapter = adapter();
        let id = ContentId::new("table-1");
        let with = |snapshot: i64, global: Option<serde_json::Value>| {
            Content::with_global(id.clone(), ContentType::IcebergTable, json!({"snapshotId": snapshot}), global)
        };
        commit(&adapter, "main", vec![Operation::put(key("t"), with(1, Some(json!("g1"))))]);
        commit(&adapter, "main", vec![Operation::put(key("t"), with(2, None))]);
        assert_eq!(global_of(&adapter, "main", "t"), Some(json!("g1")));
    }

    #[test]
    fn missing_global_state_fails_without_persisting() {
        let adapter = adapter();
        let before = head(&adapter, "main");
        let orphan = Content::with_global(
            ContentId::new("new-table"),
            ContentType::IcebergTable,
            json!({}),
            None,
        );
        let err = adapter
            .commit(
                "main",
                before,
                vec![Operation::put(key("t"), orphan)],
                CommitMeta::from_message("m"),
            )
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingGlobalState { .. }));
        assert_eq!(head(&adapter, "main"), before);
    }

    #[test]
    fn failed_commit_does_not_touch_global_state() {
        let adapter = adapter();
        let id = ContentId::new("table-1");
        let table = |g: &str| {
            Content::with_global(id.clone(), ContentType::IcebergTable, json!({}), Some(json!(g)))
        };
        let c1 = commit(&adapter, "main", vec![Operation::put(key("t"), table("g1"))]);
        commit(&adapter, "main", vec![Operation::delete(key("other"))]);

        let err = adapter
            .commit(
                "main",
                c1,
                vec![Operation::put(key("t"), table("g2"))],
                CommitMeta::from_message("stale"),
            )
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(global_of(&adapter, "main", "t"), Some(json!("g1")));
    }

    // -----------------------------------------------------------------------
    // Diff, merge, transplant
    // -----------------------------------------------------------------------

    #[test]
    fn diff_between_branches() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let dev = commit(&adapter, "dev", vec![
            Operation::put(key("b"), view("select 2")),
            Operation::delete(key("a")),
        ]);

        let diffs = adapter.diff(base, dev).unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].key, key("a"));
        assert!(diffs[0].is_removal());
        assert_eq!(diffs[1].key, key("b"));
        assert!(diffs[1].is_addition());
        assert!(adapter.diff(dev, dev).unwrap().is_empty());
    }

    #[test]
    fn merge_replays_source_commits() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        commit(&adapter, "dev", vec![Operation::put(key("b"), view("select 2"))]);
        let dev = commit(&adapter, "dev", vec![Operation::put(key("c"), view("select 3"))]);
        let main = commit(&adapter, "main", vec![Operation::put(key("d"), view("select 4"))]);

        let merged = adapter.merge(dev, "main", main).unwrap();
        assert_eq!(head(&adapter, "main"), merged);
        let names: BTreeSet<String> = entries(&adapter, merged)
            .into_iter()
            .map(|e| e.name.to_string())
            .collect();
        assert_eq!(names, BTreeSet::from(["a", "b", "c", "d"].map(String::from)));
        assert_eq!(adapter.commit_log(merged).unwrap().count(), 4);

        // Merging again is a no-op.
        assert_eq!(adapter.merge(dev, "main", merged).unwrap(), merged);
    }

    #[test]
    fn repeated_merges_replay_only_new_commits() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let dev = commit(&adapter, "dev", vec![Operation::put(key("b"), view("select 2"))]);
        let main = commit(&adapter, "main", vec![Operation::put(key("m"), view("select 3"))]);
        let merged = adapter.merge(dev, "main", main).unwrap();

        // Both sides keep working on the keys they already touched.
        let dev = commit(&adapter, "dev", vec![Operation::put(key("b"), view("select 4"))]);
        let main = commit(&adapter, "main", vec![Operation::put(key("m"), view("select 5"))]);
        assert_ne!(main, merged);

        let merged = adapter.merge(dev, "main", main).unwrap();
        assert_eq!(adapter.commit_log(merged).unwrap().count(), 5);
        let b = adapter.get_values(merged, &[key("b")]).unwrap();
        assert_eq!(b[&key("b")], view("select 4"));
        assert_eq!(adapter.merge(dev, "main", merged).unwrap(), merged);
    }

    #[test]
    fn transplanting_twice_is_a_no_op() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let d1 = commit(&adapter, "dev", vec![Operation::put(key("b"), view("select 2"))]);

        let once = adapter.transplant("main", base, &[d1]).unwrap();
        assert_eq!(adapter.transplant("main", once, &[d1]).unwrap(), once);
    }

    #[test]
    fn merge_detects_key_conflicts() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let dev = commit(&adapter, "dev", vec![Operation::put(key("a"), view("select 2"))]);
        let main = commit(&adapter, "main", vec![Operation::delete(key("a"))]);

        let err = adapter.merge(dev, "main", main).unwrap_err();
        assert!(matches!(err, AdapterError::KeyConflict { .. }));
        assert_eq!(head(&adapter, "main"), main);
    }

    #[test]
    fn merge_keeps_current_global_state() {
        let adapter = adapter();
        let id = ContentId::new("t");
        let table = |snap: i64, g: &str| {
            Content::with_global(id.clone(), ContentType::IcebergTable, json!({"snapshotId": snap}), Some(json!(g)))
        };
        let base = commit(&adapter, "main", vec![Operation::put(key("t"), table(1, "g1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let dev = commit(&adapter, "dev", vec![Operation::put(key("t"), table(2, "g2"))]);
        commit(&adapter, "main", vec![Operation::delete(key("other"))]);
        // A later direct update of the global value must survive the merge.
        commit(&adapter, "main", vec![Operation::put(key("t2"), table(9, "g3"))]);

        let main = head(&adapter, "main");
        adapter.merge(dev, "main", main).unwrap();
        assert_eq!(global_of(&adapter, "main", "t"), Some(json!("g3")));
    }

    #[test]
    fn transplant_replays_selected_commits() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let d1 = commit(&adapter, "dev", vec![Operation::put(key("b"), view("select 2"))]);
        let d2 = commit(&adapter, "dev", vec![Operation::put(key("c"), view("select 3"))]);
        let main = commit(&adapter, "main", vec![Operation::put(key("m"), view("select 4"))]);

        let new_head = adapter.transplant("main", main, &[d1, d2]).unwrap();
        assert_ne!(new_head, d2);
        assert_eq!(adapter.commit_log(new_head).unwrap().count(), 4);
        let found = adapter.get_values(new_head, &[key("b"), key("c")]).unwrap();
        assert_eq!(found.len(), 2);

        assert!(matches!(
            adapter.transplant("main", new_head, &[CommitHash::from_hash([6; 32])]),
            Err(AdapterError::ReferenceNotFound(_))
        ));
        assert_eq!(adapter.transplant("main", new_head, &[]).unwrap(), new_head);
    }

    #[test]
    fn transplant_detects_key_conflicts() {
        let adapter = adapter();
        let base = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 1"))]);
        adapter.create_reference(&NamedRef::branch("dev"), base).unwrap();
        let d1 = commit(&adapter, "dev", vec![Operation::delete(key("a"))]);
        let main = commit(&adapter, "main", vec![Operation::put(key("a"), view("select 2"))]);

        let err = adapter.transplant("main", main, &[d1]).unwrap_err();
        assert!(err.is_conflict());
    }
}
