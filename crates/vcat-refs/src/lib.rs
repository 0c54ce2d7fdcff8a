//! Reference management for the versioned catalog.
//!
//! This crate provides named references (branches and tags) that point to
//! commits in a catalog's history. References are the human-readable entry
//! points into the commit log, analogous to git refs.
//!
//! # Architecture
//!
//! - **Branches** are mutable pointers advanced by commits.
//! - **Tags** are mutable pointers that are conventionally not advanced by
//!   commits. At the storage layer both move under the same rules; the
//!   distinction is metadata.
//! - Branches and tags share one name space: a tag and a branch can never
//!   have the same name.
//! - Every update is a compare-and-swap against the hash the caller believes
//!   is current. A mismatch is reported, never retried.
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`types`]: Core ref types: [`Reference`], [`NamedRef`]
//! - [`traits`]: The [`RefStore`] trait defining the storage interface
//! - [`names`]: Reference name validation
//! - [`memory`]: In-memory [`InMemoryRefStore`]

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use memory::InMemoryRefStore;
pub use names::validate_ref_name;
pub use traits::RefStore;
pub use types::{NamedRef, Reference};
