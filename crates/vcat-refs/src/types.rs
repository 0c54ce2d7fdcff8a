//! Core reference types.
//!
//! A [`Reference`] is a named pointer with its current hash; a [`NamedRef`]
//! is just the name and kind, used to address a reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use vcat_types::CommitHash;

/// A named pointer into the commit history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    /// A branch is a mutable head advanced by commits.
    Branch {
        /// Branch name (e.g. "main", "etl/daily").
        name: String,
        /// The commit at the head of this branch.
        hash: CommitHash,
    },

    /// A tag is a pointer conventionally left where it was created.
    Tag {
        /// Tag name (e.g. "release-2024-01").
        name: String,
        /// The tagged commit.
        hash: CommitHash,
    },
}

impl Reference {
    /// Build a reference of the given kind.
    pub fn new(named: &NamedRef, hash: CommitHash) -> Self {
        match named {
            NamedRef::Branch(name) => Reference::Branch {
                name: name.clone(),
                hash,
            },
            NamedRef::Tag(name) => Reference::Tag {
                name: name.clone(),
                hash,
            },
        }
    }

    /// Returns the name of this ref.
    pub fn name(&self) -> &str {
        match self {
            Reference::Branch { name, .. } | Reference::Tag { name, .. } => name,
        }
    }

    /// Returns the hash this ref points to.
    pub fn hash(&self) -> CommitHash {
        match self {
            Reference::Branch { hash, .. } | Reference::Tag { hash, .. } => *hash,
        }
    }

    /// Returns `true` if this is a branch ref.
    pub fn is_branch(&self) -> bool {
        matches!(self, Reference::Branch { .. })
    }

    /// Returns `true` if this is a tag ref.
    pub fn is_tag(&self) -> bool {
        matches!(self, Reference::Tag { .. })
    }

    /// The name and kind of this ref.
    pub fn named_ref(&self) -> NamedRef {
        match self {
            Reference::Branch { name, .. } => NamedRef::Branch(name.clone()),
            Reference::Tag { name, .. } => NamedRef::Tag(name.clone()),
        }
    }

    /// A copy of this ref pointing at `hash`.
    pub fn with_hash(&self, hash: CommitHash) -> Self {
        Reference::new(&self.named_ref(), hash)
    }
}

/// The name and kind of a reference, without its hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedRef {
    Branch(String),
    Tag(String),
}

impl NamedRef {
    pub fn branch(name: impl Into<String>) -> Self {
        NamedRef::Branch(name.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        NamedRef::Tag(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            NamedRef::Branch(name) | NamedRef::Tag(name) => name,
        }
    }

    /// Returns `true` if `reference` has this name and kind.
    pub fn matches(&self, reference: &Reference) -> bool {
        self.name() == reference.name()
            && matches!(
                (self, reference),
                (NamedRef::Branch(_), Reference::Branch { .. })
                    | (NamedRef::Tag(_), Reference::Tag { .. })
            )
    }
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedRef::Branch(name) => write!(f, "branch '{name}'"),
            NamedRef::Tag(name) => write!(f, "tag '{name}'"),
        }
    }
}
