//! The [`RefStore`] trait defining the reference storage interface.
//!
//! Any backend (in-memory, database) implements this trait to provide named
//! reference management with compare-and-swap updates.

use vcat_types::CommitHash;

use crate::error::RefResult;
use crate::types::{NamedRef, Reference};

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`). `compare_and_swap`
/// and `delete_ref` must be atomic: two concurrent calls presenting the same
/// expected hash never both succeed.
pub trait RefStore: Send + Sync {
    /// Read a ref by name, whatever its kind.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> RefResult<Option<Reference>>;

    /// Create a new ref.
    ///
    /// Fails with [`RefError::AlreadyExists`](crate::RefError::AlreadyExists)
    /// if a branch or tag with the same name exists.
    fn create_ref(&self, reference: &Reference) -> RefResult<()>;

    /// Move `named` from `expected` to `new`.
    ///
    /// Fails with `NotFound` if no ref of that name and kind exists, and with
    /// `Conflict` (carrying the actual hash) if it does not point at
    /// `expected`. Returns the updated ref.
    fn compare_and_swap(
        &self,
        named: &NamedRef,
        expected: &CommitHash,
        new: &CommitHash,
    ) -> RefResult<Reference>;

    /// Remove `named` if it still points at `expected`.
    fn delete_ref(&self, named: &NamedRef, expected: &CommitHash) -> RefResult<()>;

    /// All refs, sorted by name.
    fn list_refs(&self) -> RefResult<Vec<Reference>>;

    /// Read a ref by name and kind.
    ///
    /// A tag looked up as a branch (or vice versa) is reported as absent.
    fn read_named(&self, named: &NamedRef) -> RefResult<Option<Reference>> {
        Ok(self
            .read_ref(named.name())?
            .filter(|reference| named.matches(reference)))
    }

    /// All branch refs.
    fn branches(&self) -> RefResult<Vec<Reference>> {
        Ok(self
            .list_refs()?
            .into_iter()
            .filter(Reference::is_branch)
            .collect())
    }

    /// All tag refs.
    fn tags(&self) -> RefResult<Vec<Reference>> {
        Ok(self
            .list_refs()?
            .into_iter()
            .filter(Reference::is_tag)
            .collect())
    }
}
