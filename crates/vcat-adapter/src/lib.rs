//! Database adapter contract and reference backend for the versioned catalog.
//!
//! A [`DatabaseAdapter`] owns three structures: named references, an
//! immutable hash-linked commit log and the shared global-state store. On
//! top of them it implements commits with compare-and-swap branch updates,
//! key-space listing, diff, merge and transplant.
//!
//! # Commit protocol
//!
//! 1. Reject duplicate keys before anything is persisted.
//! 2. Fail fast if the branch head is not the caller's expected hash.
//! 3. Check that every carried-over global value exists. Global values are
//!    never removed, so this needs no lock.
//! 4. Write the new commit to the log (an orphaned commit is harmless).
//! 5. Advance the branch with an atomic compare-and-swap. For global-state
//!    content the global store's exclusive transaction is held across the
//!    CAS and the global writes, so a failed CAS applies nothing.
//!
//! Adapters never retry. A conflict reports the actual head so the caller
//! can re-read and re-apply.
//!
//! # Backends
//!
//! - [`InMemoryDatabaseAdapter`], selected as `"In-Memory"` through the
//!   [`AdapterRegistry`].

pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod factory;
pub mod memory;
pub mod merge;
pub mod traits;
pub mod walk;

pub use config::AdapterConfig;
pub use diff::Difference;
pub use error::{AdapterError, AdapterResult};
pub use factory::{AdapterBuilder, AdapterRegistry, DatabaseAdapterFactory, InMemoryAdapterFactory};
pub use memory::InMemoryDatabaseAdapter;
pub use traits::{AdapterIter, DatabaseAdapter};
pub use walk::KeyListEntry;
