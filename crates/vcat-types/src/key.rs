//! Content keys and namespaces.
//!
//! A [`ContentKey`] names one catalog object as a sequence of path elements.
//! All elements but the last form its [`Namespace`]. Keys order
//! lexicographically over their elements.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum number of elements in a content key.
pub const MAX_ELEMENTS: usize = 20;

/// Separator used by the path-string form of keys and namespaces.
const SEPARATOR: char = '.';

/// Stand-in for a literal `.` inside an element, in path-string form.
const ESCAPED_DOT: char = '\u{1D}';

/// Ordered, non-empty sequence of path elements naming a catalog object.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ContentKey {
    elements: Vec<String>,
}

impl ContentKey {
    /// Create a key from its elements.
    ///
    /// Fails if there are no elements, more than [`MAX_ELEMENTS`], or if any
    /// element is empty or contains a NUL character.
    pub fn new<I, S>(elements: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        if elements.is_empty() {
            return Err(TypeError::InvalidKey("key must have at least one element".into()));
        }
        if elements.len() > MAX_ELEMENTS {
            return Err(TypeError::InvalidKey(format!(
                "key has {} elements, at most {MAX_ELEMENTS} allowed",
                elements.len()
            )));
        }
        for element in &elements {
            if element.is_empty() {
                return Err(TypeError::InvalidKey("key elements must not be empty".into()));
            }
            if element.contains('\0') {
                return Err(TypeError::InvalidKey(format!(
                    "key element contains NUL: {element:?}"
                )));
            }
        }
        Ok(Self { elements })
    }

    /// Parse the dotted path-string form produced by [`ContentKey::to_path_string`].
    pub fn from_path_string(path: &str) -> Result<Self, TypeError> {
        Self::new(
            path.split(SEPARATOR)
                .map(|e| e.replace(ESCAPED_DOT, ".")),
        )
    }

    /// The path elements.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Number of elements (always at least one).
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`: keys are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The leaf name (last element).
    pub fn name(&self) -> &str {
        self.elements
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Everything but the leaf name.
    pub fn namespace(&self) -> Namespace {
        Namespace {
            elements: self.elements[..self.elements.len() - 1].to_vec(),
        }
    }

    /// Truncate to the first `depth` elements.
    ///
    /// Returns an unchanged copy when the key is not longer than `depth` or
    /// when `depth` is zero.
    pub fn truncate(&self, depth: usize) -> ContentKey {
        if depth == 0 || self.elements.len() <= depth {
            return self.clone();
        }
        ContentKey {
            elements: self.elements[..depth].to_vec(),
        }
    }

    /// Dotted path-string form, escaping dots inside elements.
    pub fn to_path_string(&self) -> String {
        join_elements(&self.elements)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.to_path_string())
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

impl TryFrom<Vec<String>> for ContentKey {
    type Error = TypeError;

    fn try_from(elements: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(elements)
    }
}

impl From<ContentKey> for Vec<String> {
    fn from(key: ContentKey) -> Self {
        key.elements
    }
}

/// Ordered sequence of namespace elements, possibly empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    elements: Vec<String>,
}

impl Namespace {
    /// The empty (root) namespace.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a namespace from its elements.
    pub fn new<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted namespace name. The empty string is the root namespace.
    pub fn parse(name: &str) -> Self {
        if name.is_empty() {
            return Self::empty();
        }
        Self::new(name.split(SEPARATOR).map(|e| e.replace(ESCAPED_DOT, ".")))
    }

    /// The namespace elements.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Returns `true` for the root namespace.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Dotted name (`""` for the root namespace).
    pub fn name(&self) -> String {
        join_elements(&self.elements)
    }

    /// Element-wise prefix test: `a.b.c` starts with `[a, b]` but `a.boo`
    /// does not.
    pub fn starts_with<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        prefix.len() <= self.elements.len()
            && prefix
                .iter()
                .zip(&self.elements)
                .all(|(p, e)| p.as_ref() == e)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn join_elements(elements: &[String]) -> String {
    let escaped: Vec<String> = elements
        .iter()
        .map(|e| e.replace(SEPARATOR, &ESCAPED_DOT.to_string()))
        .collect();
    escaped.join(".")
}
