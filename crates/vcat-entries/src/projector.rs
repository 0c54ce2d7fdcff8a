//! Depth grouping and filtering of a key listing.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use vcat_types::{ContentKey, Entry};

use crate::filter::EntryFilter;

/// How a listing is shaped.
///
/// With `namespace_depth == 0` entries pass through as stored. With a depth
/// `d > 0`, every key longer than `d` elements is replaced by a synthetic
/// [`ContentType::Unknown`](vcat_types::ContentType::Unknown) entry for its
/// first `d` elements, emitted once per distinct prefix. The filter sees
/// entries after this grouping.
#[derive(Clone, Default)]
pub struct EntriesQuery {
    pub namespace_depth: usize,
    pub filter: Option<Arc<dyn EntryFilter>>,
}

impl EntriesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace_depth(mut self, depth: usize) -> Self {
        self.namespace_depth = depth;
        self
    }

    pub fn with_filter(mut self, filter: impl EntryFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Lazily project a fallible entry stream. Errors pass through in
    /// place.
    pub fn project<I, E>(&self, entries: I) -> Projection<I::IntoIter>
    where
        I: IntoIterator<Item = Result<Entry, E>>,
    {
        Projection {
            inner: entries.into_iter(),
            depth: self.namespace_depth,
            filter: self.filter.clone(),
            emitted: HashSet::new(),
        }
    }

    /// Project an in-memory listing.
    pub fn apply(&self, entries: impl IntoIterator<Item = Entry>) -> Vec<Entry> {
        self.project(entries.into_iter().map(Ok::<_, Infallible>))
            .map(|entry| match entry {
                Ok(entry) => entry,
                Err(never) => match never {},
            })
            .collect()
    }
}

impl fmt::Debug for EntriesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntriesQuery")
            .field("namespace_depth", &self.namespace_depth)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// Iterator returned by [`EntriesQuery::project`].
pub struct Projection<I> {
    inner: I,
    depth: usize,
    filter: Option<Arc<dyn EntryFilter>>,
    /// Synthetic names already produced.
    emitted: HashSet<ContentKey>,
}

impl<I> Projection<I> {
    fn group(&mut self, entry: Entry) -> Option<Entry> {
        if self.depth == 0 || entry.name.len() <= self.depth {
            return Some(entry);
        }
        let truncated = entry.name.truncate(self.depth);
        if self.emitted.insert(truncated.clone()) {
            Some(Entry::synthetic(truncated))
        } else {
            None
        }
    }

    fn keep(&self, entry: &Entry) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.matches(entry))
    }
}

impl<I, E> Iterator for Projection<I>
where
    I: Iterator<Item = Result<Entry, E>>,
{
    type Item = Result<Entry, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let Some(entry) = self.group(entry) else {
                continue;
            };
            if self.keep(&entry) {
                return Some(Ok(entry));
            }
        }
    }
}
