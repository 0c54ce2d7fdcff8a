//! Listing projection for the versioned catalog.
//!
//! Takes the flat `(key, type)` listing of a commit and shapes it for a
//! caller:
//!
//! - [`EntriesQuery::namespace_depth`] collapses keys deeper than the
//!   requested depth into synthetic `UNKNOWN` namespace entries;
//! - [`EntriesQuery::filter`] keeps only entries matching an
//!   [`EntryFilter`], evaluated after grouping.
//!
//! Projection is lazy and single-pass. Result order follows discovery order
//! and carries no meaning.

pub mod filter;
pub mod projector;

pub use filter::{
    all_of, any_of, not, AllOf, AnyOf, ContentTypeIn, EntryFilter, NameEquals, NamespacePrefix,
    NamespaceStartsWith, Not,
};
pub use projector::{EntriesQuery, Projection};
