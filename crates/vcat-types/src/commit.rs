use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::key::ContentKey;

/// Descriptive metadata attached to a commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    pub message: String,
    pub author: Option<String>,
    pub committer: Option<String>,
    pub author_time: Option<DateTime<Utc>>,
    /// Stamped by the adapter when left unset.
    pub commit_time: Option<DateTime<Utc>>,
    pub properties: BTreeMap<String, String>,
}

impl CommitMeta {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_committer(mut self, committer: impl Into<String>) -> Self {
        self.committer = Some(committer.into());
        self
    }

    pub fn with_author_time(mut self, time: DateTime<Utc>) -> Self {
        self.author_time = Some(time);
        self
    }

    pub fn with_commit_time(mut self, time: DateTime<Utc>) -> Self {
        self.commit_time = Some(time);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A change to one key, applied as part of a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Create or replace the content at `key`.
    Put { key: ContentKey, content: Content },
    /// Remove `key` from the live key space.
    Delete { key: ContentKey },
    /// Record `key` as part of the commit without changing it.
    Unchanged { key: ContentKey },
}

impl Operation {
    pub fn put(key: ContentKey, content: Content) -> Self {
        Self::Put { key, content }
    }

    pub fn delete(key: ContentKey) -> Self {
        Self::Delete { key }
    }

    pub fn unchanged(key: ContentKey) -> Self {
        Self::Unchanged { key }
    }

    /// The key this operation targets.
    pub fn key(&self) -> &ContentKey {
        match self {
            Self::Put { key, .. } | Self::Delete { key } | Self::Unchanged { key } => key,
        }
    }

    /// Returns `true` if the operation changes the key space.
    pub fn is_modifying(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }
}
