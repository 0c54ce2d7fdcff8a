//! In-process API of the versioned catalog.
//!
//! [`Catalog`] is what a transport layer calls: it selects a backend
//! through the adapter registry, manages branches and tags, applies commits
//! and answers namespace-aware listing queries.
//!
//! ```
//! use vcat_catalog::{Catalog, CommitRequest, EntriesParams};
//! use vcat_types::{CommitHash, Content, ContentKey};
//!
//! let catalog = Catalog::in_memory().unwrap();
//! let key = ContentKey::new(["db", "orders"]).unwrap();
//! catalog
//!     .commit(
//!         "main",
//!         CommitHash::NO_ANCESTOR,
//!         CommitRequest::new("create orders")
//!             .put(key, Content::iceberg_table("s3://orders/v1.json", 1, 0, 0, 0)),
//!     )
//!     .unwrap();
//!
//! let grouped = EntriesParams::new().with_namespace_depth(1);
//! let entries = catalog.get_entries("main", &grouped).unwrap();
//! assert_eq!(entries[0].name.to_string(), "db");
//! ```

pub mod catalog;
pub mod commit;
pub mod error;

pub use catalog::{Catalog, EntriesParams};
pub use commit::{CommitRequest, LogEntry};
pub use error::{CatalogError, CatalogResult};

pub use vcat_adapter::{AdapterConfig, AdapterRegistry, Difference};
pub use vcat_entries::{EntriesQuery, EntryFilter};
pub use vcat_refs::{NamedRef, Reference};
