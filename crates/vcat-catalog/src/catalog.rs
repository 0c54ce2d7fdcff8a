use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use vcat_adapter::{
    AdapterConfig, AdapterRegistry, DatabaseAdapter, Difference, InMemoryAdapterFactory,
};
use vcat_entries::{EntriesQuery, EntryFilter};
use vcat_refs::{NamedRef, Reference};
use vcat_types::{CommitHash, Content, ContentKey, Entry};

use crate::commit::{CommitRequest, LogEntry};
use crate::error::{CatalogError, CatalogResult};

/// Parameters of a listing request.
#[derive(Clone, Debug, Default)]
pub struct EntriesParams {
    /// List at this commit of the reference instead of its head.
    pub hash_on_ref: Option<CommitHash>,
    pub query: EntriesQuery,
}

impl EntriesParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_hash(mut self, hash: CommitHash) -> Self {
        self.hash_on_ref = Some(hash);
        self
    }

    pub fn with_namespace_depth(mut self, depth: usize) -> Self {
        self.query = self.query.with_namespace_depth(depth);
        self
    }

    pub fn with_filter(mut self, filter: impl EntryFilter + 'static) -> Self {
        self.query = self.query.with_filter(filter);
        self
    }
}

/// In-process entry point of the versioned catalog.
///
/// Wraps one [`DatabaseAdapter`] and resolves reference names to hashes for
/// callers. Cheap to clone; clones share the adapter.
#[derive(Clone)]
pub struct Catalog {
    adapter: Arc<dyn DatabaseAdapter>,
}

impl Catalog {
    pub fn new(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self { adapter }
    }

    /// A catalog on a fresh in-memory adapter with the default config.
    pub fn in_memory() -> CatalogResult<Self> {
        Self::from_registry(
            &AdapterRegistry::with_defaults(),
            InMemoryAdapterFactory::NAME,
            AdapterConfig::default(),
        )
    }

    /// Build the backend registered as `backend` with `config`.
    pub fn from_registry(
        registry: &AdapterRegistry,
        backend: &str,
        config: AdapterConfig,
    ) -> CatalogResult<Self> {
        let adapter = registry.builder(backend)?.with_config(config).build()?;
        Ok(Self::new(adapter))
    }

    pub fn adapter(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.adapter
    }

    pub fn default_branch(&self) -> &str {
        &self.adapter.config().default_branch
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    pub fn get_reference(&self, name: &str) -> CatalogResult<Reference> {
        Ok(self.adapter.get_reference(name)?)
    }

    pub fn references(&self) -> CatalogResult<Vec<Reference>> {
        Ok(self.adapter.named_refs()?)
    }

    pub fn create_reference(&self, named: &NamedRef, from: CommitHash) -> CatalogResult<Reference> {
        Ok(self.adapter.create_reference(named, from)?)
    }

    /// Create a branch at the current head of `source`.
    pub fn create_branch(&self, name: &str, source: &str) -> CatalogResult<Reference> {
        let from = self.adapter.hash_on_reference(source, None)?;
        self.create_reference(&NamedRef::branch(name), from)
    }

    pub fn delete_reference(&self, named: &NamedRef, expected: CommitHash) -> CatalogResult<()> {
        Ok(self.adapter.delete_reference(named, expected)?)
    }

    pub fn assign(
        &self,
        named: &NamedRef,
        expected: CommitHash,
        to: CommitHash,
    ) -> CatalogResult<Reference> {
        Ok(self.adapter.assign(named, expected, to)?)
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    /// Commit `request` to `branch`, whose head must be `expected`.
    ///
    /// On `ReferenceConflict` nothing changed; re-read the head and retry.
    pub fn commit(
        &self,
        branch: &str,
        expected: CommitHash,
        request: CommitRequest,
    ) -> CatalogResult<CommitHash> {
        if request.message.trim().is_empty() {
            return Err(CatalogError::InvalidOperation(
                "commit message must not be empty".into(),
            ));
        }
        let (operations, meta) = request.into_parts();
        Ok(self.adapter.commit(branch, expected, operations, meta)?)
    }

    pub fn merge(&self, from_ref: &str, to_branch: &str, expected: CommitHash) -> CatalogResult<CommitHash> {
        let from = self.adapter.hash_on_reference(from_ref, None)?;
        Ok(self.adapter.merge(from, to_branch, expected)?)
    }

    pub fn transplant(
        &self,
        to_branch: &str,
        expected: CommitHash,
        commits: &[CommitHash],
    ) -> CatalogResult<CommitHash> {
        Ok(self.adapter.transplant(to_branch, expected, commits)?)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// List the keys of `reference`, grouped and filtered per `params`.
    pub fn get_entries(&self, reference: &str, params: &EntriesParams) -> CatalogResult<Vec<Entry>> {
        let at = self.adapter.hash_on_reference(reference, params.hash_on_ref)?;
        let entries = params
            .query
            .project(self.adapter.get_entries(at)?)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            reference,
            hash = %at.short_hex(),
            depth = params.query.namespace_depth,
            count = entries.len(),
            "listed entries"
        );
        Ok(entries)
    }

    /// Content at `key` on the head of `reference`, with global state.
    pub fn get_content(&self, reference: &str, key: &ContentKey) -> CatalogResult<Option<Content>> {
        let mut values = self.get_contents(reference, std::slice::from_ref(key))?;
        Ok(values.remove(key))
    }

    pub fn get_contents(
        &self,
        reference: &str,
        keys: &[ContentKey],
    ) -> CatalogResult<BTreeMap<ContentKey, Content>> {
        let at = self.adapter.hash_on_reference(reference, None)?;
        Ok(self.adapter.get_values(at, keys)?)
    }

    /// Commits on `reference`, newest first, at most `limit` of them.
    pub fn commit_log(&self, reference: &str, limit: Option<usize>) -> CatalogResult<Vec<LogEntry>> {
        let head = self.adapter.hash_on_reference(reference, None)?;
        let mut log = Vec::new();
        for entry in self.adapter.commit_log(head)?.take(limit.unwrap_or(usize::MAX)) {
            log.push(LogEntry::from(entry?.as_ref()));
        }
        Ok(log)
    }

    pub fn diff(&self, from_ref: &str, to_ref: &str) -> CatalogResult<Vec<Difference>> {
        let from = self.adapter.hash_on_reference(from_ref, None)?;
        let to = self.adapter.hash_on_reference(to_ref, None)?;
        Ok(self.adapter.diff(from, to)?)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", self.adapter.config())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;
    use vcat_adapter::AdapterError;
    use vcat_entries::{ContentTypeIn, NamespacePrefix};
    use vcat_types::{ContentId, ContentType};

    fn key(path: &str) -> ContentKey {
        ContentKey::from_path_string(path).unwrap()
    }

    fn head(catalog: &Catalog, name: &str) -> CommitHash {
        catalog.get_reference(name).unwrap().hash()
    }

    fn table(location: &str) -> Content {
        Content::iceberg_table(location, 1, 0, 0, 0)
    }

    fn names(entries: Vec<Entry>) -> BTreeSet<(String, ContentType)> {
        entries
            .into_iter()
            .map(|e| (e.name.to_string(), e.content_type))
            .collect()
    }

    fn nested_catalog() -> Catalog {
        let catalog = Catalog::in_memory().unwrap();
        let mut request = CommitRequest::new("tables");
        for path in [
            "a.b.c.firstTable",
            "a.b.c.secondTable",
            "a.b.fourthTable",
            "a.thirdTable",
            "a.boo.fifthTable",
        ] {
            request = request.put(key(path), table(&format!("s3://{path}")));
        }
        catalog
            .commit("main", CommitHash::NO_ANCESTOR, request)
            .unwrap();
        catalog
    }

    #[test]
    fn in_memory_catalog_starts_with_default_branch() {
        let catalog = Catalog::in_memory().unwrap();
        assert_eq!(catalog.default_branch(), "main");
        assert_eq!(head(&catalog, "main"), CommitHash::NO_ANCESTOR);
        assert!(catalog.get_entries("main", &EntriesParams::new()).unwrap().is_empty());
    }

    #[test]
    fn unknown_backend_is_reported() {
        let err = Catalog::from_registry(
            &AdapterRegistry::with_defaults(),
            "Rocks",
            AdapterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Adapter(AdapterError::UnknownBackend(_))));
    }

    #[test]
    fn depth_and_namespace_prefix() {
        let catalog = nested_catalog();
        let params = EntriesParams::new()
            .with_namespace_depth(3)
            .with_filter(NamespacePrefix::new(["a", "b"]));
        let entries = catalog.get_entries("main", &params).unwrap();
        assert_eq!(
            names(entries),
            BTreeSet::from([
                ("a.b.c".to_string(), ContentType::Unknown),
                ("a.b.fourthTable".to_string(), ContentType::IcebergTable),
            ])
        );
    }

    #[test]
    fn prefix_without_matches_is_empty() {
        let catalog = nested_catalog();
        let params = EntriesParams::new().with_filter(NamespacePrefix::new(["a", "fourthTable"]));
        assert!(catalog.get_entries("main", &params).unwrap().is_empty());
    }

    #[test]
    fn type_filter() {
        let catalog = Catalog::in_memory().unwrap();
        catalog
            .commit(
                "main",
                CommitHash::NO_ANCESTOR,
                CommitRequest::new("two objects")
                    .put(key("a"), table("s3://a"))
                    .put(key("b"), Content::sql_view("select 1", "SPARK")),
            )
            .unwrap();

        let all = catalog.get_entries("main", &EntriesParams::new()).unwrap();
        assert_eq!(all.len(), 2);

        let views = catalog
            .get_entries(
                "main",
                &EntriesParams::new().with_filter(ContentTypeIn(vec![ContentType::View])),
            )
            .unwrap();
        assert_eq!(names(views), BTreeSet::from([("b".to_string(), ContentType::View)]));
    }

    #[test]
    fn listing_at_earlier_hash() {
        let catalog = Catalog::in_memory().unwrap();
        let c1 = catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("one").put(key("x"), table("s3://x")))
            .unwrap();
        catalog
            .commit("main", c1, CommitRequest::new("two").delete(key("x")))
            .unwrap();

        assert!(catalog.get_entries("main", &EntriesParams::new()).unwrap().is_empty());
        let then = catalog
            .get_entries("main", &EntriesParams::new().at_hash(c1))
            .unwrap();
        assert_eq!(then.len(), 1);
    }

    #[test]
    fn empty_message_is_rejected() {
        let catalog = Catalog::in_memory().unwrap();
        let err = catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("  "))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidOperation(_)));
        assert!(err.is_retry_safe());
    }

    #[test]
    fn conflict_then_retry() {
        let catalog = Catalog::in_memory().unwrap();
        let c1 = catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("first").put(key("a"), table("s3://a")))
            .unwrap();

        let err = catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("stale").put(key("b"), table("s3://b")))
            .unwrap_err();
        assert!(err.is_conflict());

        let current = head(&catalog, "main");
        assert_eq!(current, c1);
        catalog
            .commit("main", current, CommitRequest::new("retried").put(key("b"), table("s3://b")))
            .unwrap();
        assert_eq!(catalog.get_entries("main", &EntriesParams::new()).unwrap().len(), 2);
    }

    #[test]
    fn global_state_visible_from_other_branch() {
        let catalog = Catalog::in_memory().unwrap();
        let id = ContentId::new("orders");
        let v1 = Content::iceberg_table("s3://orders/v1.json", 1, 0, 0, 0).with_id(id.clone());
        catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("create").put(key("db.orders"), v1))
            .unwrap();
        catalog.create_branch("etl", "main").unwrap();

        let v2 = Content::iceberg_table("s3://orders/v2.json", 2, 0, 0, 0).with_id(id);
        let etl_head = head(&catalog, "etl");
        catalog
            .commit("etl", etl_head, CommitRequest::new("append").put(key("db.orders"), v2))
            .unwrap();

        let on_main = catalog.get_content("main", &key("db.orders")).unwrap().unwrap();
        assert_eq!(on_main.global(), Some(&json!({"metadataLocation": "s3://orders/v2.json"})));
        match on_main {
            Content::WithGlobalState { on_ref, .. } => assert_eq!(on_ref["snapshotId"], 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn commit_log_with_limit() {
        let catalog = Catalog::in_memory().unwrap();
        let mut expected = CommitHash::NO_ANCESTOR;
        for i in 0..3 {
            expected = catalog
                .commit(
                    "main",
                    expected,
                    CommitRequest::new(format!("commit {i}")).with_author("etl"),
                )
                .unwrap();
        }
        let log = catalog.commit_log("main", Some(2)).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].hash, expected);
        assert_eq!(log[0].message, "commit 2");
        assert_eq!(log[0].author.as_deref(), Some("etl"));
        assert_eq!(catalog.commit_log("main", None).unwrap().len(), 3);
    }

    #[test]
    fn diff_and_merge_between_branches() {
        let catalog = Catalog::in_memory().unwrap();
        let base = catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("base").put(key("a"), table("s3://a")))
            .unwrap();
        catalog.create_branch("dev", "main").unwrap();
        catalog
            .commit("dev", base, CommitRequest::new("dev work").put(key("b"), Content::sql_view("select 1", "SPARK")))
            .unwrap();

        let diff = catalog.diff("main", "dev").unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].key, key("b"));

        catalog.merge("dev", "main", base).unwrap();
        assert!(catalog.diff("main", "dev").unwrap().is_empty());
    }

    #[test]
    fn tags_and_reference_lifecycle() {
        let catalog = Catalog::in_memory().unwrap();
        let c1 = catalog
            .commit("main", CommitHash::NO_ANCESTOR, CommitRequest::new("one").put(key("a"), table("s3://a")))
            .unwrap();
        catalog.create_reference(&NamedRef::tag("v1"), c1).unwrap();

        let refs: Vec<String> = catalog
            .references()
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(refs, vec!["main", "v1"]);

        assert_eq!(catalog.get_entries("v1", &EntriesParams::new()).unwrap().len(), 1);
        catalog.delete_reference(&NamedRef::tag("v1"), c1).unwrap();
        assert!(catalog.get_reference("v1").is_err());
    }
}
