//! Foundation types for the versioned catalog (VCAT).
//!
//! This crate provides the value types shared by every other VCAT crate:
//! commit hashes, content keys and namespaces, the content model with its
//! two state variants, commit operations and metadata, and listing entries.
//!
//! # Key Types
//!
//! - [`CommitHash`]: Content-addressed commit identifier (BLAKE3 digest)
//! - [`ContentKey`] / [`Namespace`]: Hierarchical catalog object names
//! - [`Content`]: Simple content or content with separately-versioned global state
//! - [`ContentType`]: The kind of catalog object stored at a key
//! - [`Operation`]: `Put`, `Delete` or `Unchanged` for one key in a commit
//! - [`CommitMeta`]: Message, author and timestamps of a commit
//! - [`Entry`]: A projected `(key, type)` pair produced by listings

pub mod commit;
pub mod content;
pub mod entry;
pub mod error;
pub mod hash;
pub mod key;

pub use commit::{CommitMeta, Operation};
pub use content::{Content, ContentId, ContentType};
pub use entry::Entry;
pub use error::TypeError;
pub use hash::CommitHash;
pub use key::{ContentKey, Namespace};
