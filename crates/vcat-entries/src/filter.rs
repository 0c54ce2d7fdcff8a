//! Entry predicates.
//!
//! An [`EntryFilter`] is a side-effect-free boolean function of an entry's
//! name, namespace and type. Any `Fn(&Entry) -> bool` closure is a filter;
//! the structs below cover the common cases and compose with [`all_of`],
//! [`any_of`] and [`not`].

use vcat_types::{ContentType, Entry};

/// A predicate over listed entries.
pub trait EntryFilter: Send + Sync {
    fn matches(&self, entry: &Entry) -> bool;
}

impl<F> EntryFilter for F
where
    F: Fn(&Entry) -> bool + Send + Sync,
{
    fn matches(&self, entry: &Entry) -> bool {
        self(entry)
    }
}

/// Matches entries whose type is one of the given types.
#[derive(Clone, Debug)]
pub struct ContentTypeIn(pub Vec<ContentType>);

impl EntryFilter for ContentTypeIn {
    fn matches(&self, entry: &Entry) -> bool {
        self.0.contains(&entry.content_type)
    }
}

/// Matches entries whose namespace begins with the given elements.
///
/// `["a", "b"]` matches namespaces `a.b` and `a.b.c` but not `a.boo`.
#[derive(Clone, Debug)]
pub struct NamespacePrefix(pub Vec<String>);

impl NamespacePrefix {
    pub fn new<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(elements.into_iter().map(Into::into).collect())
    }
}

impl EntryFilter for NamespacePrefix {
    fn matches(&self, entry: &Entry) -> bool {
        entry.namespace().starts_with(&self.0)
    }
}

/// Matches entries whose dotted namespace name starts with a string.
///
/// Unlike [`NamespacePrefix`] this is a plain string comparison, so `"a.b"`
/// also matches `a.boo`.
#[derive(Clone, Debug)]
pub struct NamespaceStartsWith(pub String);

impl EntryFilter for NamespaceStartsWith {
    fn matches(&self, entry: &Entry) -> bool {
        entry.namespace().name().starts_with(self.0.as_str())
    }
}

/// Matches entries whose leaf name equals the given name.
#[derive(Clone, Debug)]
pub struct NameEquals(pub String);

impl EntryFilter for NameEquals {
    fn matches(&self, entry: &Entry) -> bool {
        entry.name.name() == self.0
    }
}

pub struct AllOf(Vec<Box<dyn EntryFilter>>);

impl EntryFilter for AllOf {
    fn matches(&self, entry: &Entry) -> bool {
        self.0.iter().all(|filter| filter.matches(entry))
    }
}

pub struct AnyOf(Vec<Box<dyn EntryFilter>>);

impl EntryFilter for AnyOf {
    fn matches(&self, entry: &Entry) -> bool {
        self.0.iter().any(|filter| filter.matches(entry))
    }
}

pub struct Not(Box<dyn EntryFilter>);

impl EntryFilter for Not {
    fn matches(&self, entry: &Entry) -> bool {
        !self.0.matches(entry)
    }
}

/// Matches when every filter matches (and when there are none).
pub fn all_of(filters: Vec<Box<dyn EntryFilter>>) -> AllOf {
    AllOf(filters)
}

/// Matches when at least one filter matches.
pub fn any_of(filters: Vec<Box<dyn EntryFilter>>) -> AnyOf {
    AnyOf(filters)
}

pub fn not(filter: impl EntryFilter + 'static) -> Not {
    Not(Box::new(filter))
}
