use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vcat_store::CommitLogEntry;
use vcat_types::{CommitHash, CommitMeta, Content, ContentKey, Operation};

/// A commit to be applied through [`Catalog::commit`](crate::Catalog::commit).
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub message: String,
    pub author: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub operations: Vec<Operation>,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author: None,
            properties: BTreeMap::new(),
            operations: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn put(mut self, key: ContentKey, content: Content) -> Self {
        self.operations.push(Operation::put(key, content));
        self
    }

    pub fn delete(mut self, key: ContentKey) -> Self {
        self.operations.push(Operation::delete(key));
        self
    }

    pub fn unchanged(mut self, key: ContentKey) -> Self {
        self.operations.push(Operation::unchanged(key));
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<Operation>, CommitMeta) {
        let mut meta = CommitMeta::from_message(self.message);
        if let Some(author) = self.author {
            meta = meta.with_author(author.clone()).with_committer(author);
        }
        for (key, value) in self.properties {
            meta = meta.with_property(key, value);
        }
        (self.operations, meta)
    }
}

/// Summary of one commit in a log listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub hash: CommitHash,
    pub parent: Option<CommitHash>,
    pub message: String,
    pub author: Option<String>,
    pub commit_time: Option<DateTime<Utc>>,
    pub operations: usize,
}

impl From<&CommitLogEntry> for LogEntry {
    fn from(entry: &CommitLogEntry) -> Self {
        Self {
            hash: entry.hash,
            parent: entry.parent,
            message: entry.meta.message.clone(),
            author: entry.meta.author.clone(),
            commit_time: entry.meta.commit_time,
            operations: entry.operations.len(),
        }
    }
}
