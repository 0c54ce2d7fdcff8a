//! In-memory reference store.
//!
//! [`InMemoryRefStore`] keeps all refs in a `HashMap` protected by a
//! `RwLock`. Every mutation (create, compare-and-swap, delete) runs as a
//! single check-then-write under the write lock, which makes it atomic.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use vcat_types::CommitHash;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::{NamedRef, Reference};

/// An in-memory implementation of [`RefStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, Reference>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(e: impl std::fmt::Display) -> RefError {
    RefError::Storage(format!("lock poisoned: {e}"))
}

fn not_found(named: &NamedRef) -> RefError {
    RefError::NotFound {
        name: named.name().to_string(),
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<Reference>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs.get(name).cloned())
    }

    fn create_ref(&self, reference: &Reference) -> RefResult<()> {
        validate_ref_name(reference.name())?;

        let mut refs = self.refs.write().map_err(poisoned)?;
        if refs.contains_key(reference.name()) {
            return Err(RefError::AlreadyExists {
                name: reference.name().to_string(),
            });
        }
        refs.insert(reference.name().to_string(), reference.clone());
        debug!(name = reference.name(), hash = %reference.hash().short_hex(), "ref created");
        Ok(())
    }

    fn compare_and_swap(
        &self,
        named: &NamedRef,
        expected: &CommitHash,
        new: &CommitHash,
    ) -> RefResult<Reference> {
        let mut refs = self.refs.write().map_err(poisoned)?;
        let current = refs
            .get_mut(named.name())
            .filter(|current| named.matches(current))
            .ok_or_else(|| not_found(named))?;

        if current.hash() != *expected {
            return Err(RefError::Conflict {
                name: named.name().to_string(),
                expected: *expected,
                actual: current.hash(),
            });
        }

        *current = current.with_hash(*new);
        Ok(current.clone())
    }

    fn delete_ref(&self, named: &NamedRef, expected: &CommitHash) -> RefResult<()> {
        let mut refs = self.refs.write().map_err(poisoned)?;
        let current = refs
            .get(named.name())
            .filter(|current| named.matches(current))
            .ok_or_else(|| not_found(named))?;

        if current.hash() != *expected {
            return Err(RefError::Conflict {
                name: named.name().to_string(),
                expected: *expected,
                actual: current.hash(),
            });
        }

        refs.remove(named.name());
        debug!(name = named.name(), "ref deleted");
        Ok(())
    }

    fn list_refs(&self) -> RefResult<Vec<Reference>> {
        let refs = self.refs.read().map_err(poisoned)?;
        let mut result: Vec<Reference> = refs.values().cloned().collect();
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }
}
