//! Key-space diff between two commits.

use std::collections::BTreeMap;

use vcat_types::{Content, ContentKey};

/// One key whose content differs between two commits.
///
/// `from` is `None` when the key was added, `to` is `None` when it was
/// removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Difference {
    pub key: ContentKey,
    pub from: Option<Content>,
    pub to: Option<Content>,
}

impl Difference {
    pub fn is_addition(&self) -> bool {
        self.from.is_none()
    }

    pub fn is_removal(&self) -> bool {
        self.to.is_none()
    }
}

/// Compare two resolved key spaces. Output is ordered by key.
pub fn diff_key_spaces(
    from: &BTreeMap<ContentKey, Content>,
    to: &BTreeMap<ContentKey, Content>,
) -> Vec<Difference> {
    let mut differences = Vec::new();

    for (key, old) in from {
        match to.get(key) {
            Some(new) if new == old => {}
            new => differences.push(Difference {
                key: key.clone(),
                from: Some(old.clone()),
                to: new.cloned(),
            }),
        }
    }
    for (key, new) in to {
        if !from.contains_key(key) {
            differences.push(Difference {
                key: key.clone(),
                from: None,
                to: Some(new.clone()),
            });
        }
    }

    differences.sort_by(|a, b| a.key.cmp(&b.key));
    differences
}
