use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::ContentType;
use crate::key::{ContentKey, Namespace};

/// One row of a key listing: a live key and the type of its content.
///
/// Entries with [`ContentType::Unknown`] are synthetic namespace nodes
/// produced by depth grouping; they never correspond to a stored key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entry {
    pub name: ContentKey,
    pub content_type: ContentType,
}

impl Entry {
    pub fn new(name: ContentKey, content_type: ContentType) -> Self {
        Self { name, content_type }
    }

    /// A synthetic namespace node.
    pub fn synthetic(name: ContentKey) -> Self {
        Self {
            name,
            content_type: ContentType::Unknown,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.name.namespace()
    }

    pub fn is_synthetic(&self) -> bool {
        self.content_type == ContentType::Unknown
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.content_type)
    }
}
