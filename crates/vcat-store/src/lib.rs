//! Commit log and global-state storage for the versioned catalog.
//!
//! This crate implements the two persistent structures behind a database
//! adapter:
//!
//! - the **commit log**, a hash-keyed store of immutable
//!   [`CommitLogEntry`] objects linked by parent hashes, analogous to git's
//!   object database restricted to commits;
//! - the **global-state store**, one mutable [`GlobalState`] value per
//!   content id, shared by every reference.
//!
//! # Storage Backends
//!
//! - [`InMemoryCommitLog`] / [`InMemoryGlobalStateStore`] - `HashMap`-based
//!   stores for tests and embedding
//!
//! # Design Rules
//!
//! 1. Commit log entries are immutable once written; writes are idempotent.
//! 2. Write-then-link: the log verifies an entry's hash on write, before any
//!    reference may point at it.
//! 3. Concurrent reads of the log are always safe.
//! 4. Global state changes only inside a [`GlobalStateTxn`], which holds
//!    exclusive access until dropped.
//! 5. All failures are propagated, never silently ignored.

pub mod error;
pub mod log;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use log::{CommitLogEntry, GlobalState, KeyList};
pub use memory::{InMemoryCommitLog, InMemoryGlobalStateStore};
pub use traits::{CommitLog, GlobalStateStore, GlobalStateTxn};
