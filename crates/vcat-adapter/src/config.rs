use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult};

/// Configuration handed to an [`AdapterBuilder`](crate::AdapterBuilder).
///
/// All fields have defaults, so a partial document deserializes into a
/// usable config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Distinguishes repositories that share one storage medium.
    pub repository_id: String,
    /// Branch created by `initialize_repo` on an empty repository.
    pub default_branch: String,
    /// Every n-th commit carries a full key list, bounding how far a
    /// key-space lookup walks back through history.
    pub key_list_distance: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            repository_id: String::new(),
            default_branch: "main".into(),
            key_list_distance: 20,
        }
    }
}

impl AdapterConfig {
    pub fn with_repository_id(mut self, id: impl Into<String>) -> Self {
        self.repository_id = id.into();
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn with_key_list_distance(mut self, distance: u64) -> Self {
        self.key_list_distance = distance;
        self
    }

    /// Check the config before an adapter is built from it.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.key_list_distance == 0 {
            return Err(AdapterError::InvalidConfig(
                "key_list_distance must be at least 1".into(),
            ));
        }
        vcat_refs::validate_ref_name(&self.default_branch)
            .map_err(|e| AdapterError::InvalidConfig(e.to_string()))
    }
}
