//! The content model.
//!
//! Every value stored at a [`ContentKey`](crate::ContentKey) is a [`Content`].
//! Content comes in two shapes:
//!
//! - [`Content::Simple`]: the payload lives entirely in commit history.
//! - [`Content::WithGlobalState`]: the payload is split into `on_ref` state,
//!   versioned by history and therefore allowed to differ per branch, and
//!   `global` state, a single value per content id shared by every reference.
//!
//! A `Put` of global-state content may leave `global` unset, in which case the
//! content id's current global value is carried forward.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::TypeError;

/// Opaque, stable identifier of one catalog object across renames and branches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of catalog object stored at a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    /// Synthetic intermediate namespace node produced by depth grouping.
    Unknown,
    IcebergTable,
    DeltaLakeTable,
    View,
    Namespace,
}

impl ContentType {
    /// Upper-case wire name, e.g. `ICEBERG_TABLE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::IcebergTable => "ICEBERG_TABLE",
            Self::DeltaLakeTable => "DELTA_LAKE_TABLE",
            Self::View => "VIEW",
            Self::Namespace => "NAMESPACE",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(Self::Unknown),
            "ICEBERG_TABLE" => Ok(Self::IcebergTable),
            "DELTA_LAKE_TABLE" => Ok(Self::DeltaLakeTable),
            "VIEW" => Ok(Self::View),
            "NAMESPACE" => Ok(Self::Namespace),
            other => Err(TypeError::UnknownContentType(other.to_string())),
        }
    }
}

/// A typed value stored at a content key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Content {
    /// Payload fully embedded and versioned by its position in history.
    Simple {
        id: ContentId,
        content_type: ContentType,
        payload: Value,
    },
    /// Payload split into per-reference and shared global state.
    WithGlobalState {
        id: ContentId,
        content_type: ContentType,
        on_ref: Value,
        /// `None` in a `Put` means "keep the current global value".
        global: Option<Value>,
    },
}

impl Content {
    /// Simple content with an explicit id.
    pub fn simple(id: ContentId, content_type: ContentType, payload: Value) -> Self {
        Self::Simple {
            id,
            content_type,
            payload,
        }
    }

    /// Global-state content with an explicit id.
    pub fn with_global(
        id: ContentId,
        content_type: ContentType,
        on_ref: Value,
        global: Option<Value>,
    ) -> Self {
        Self::WithGlobalState {
            id,
            content_type,
            on_ref,
            global,
        }
    }

    /// A new Iceberg table. The metadata location is global state, the
    /// snapshot/schema/spec/sort-order ids are on-reference state.
    pub fn iceberg_table(
        metadata_location: impl Into<String>,
        snapshot_id: i64,
        schema_id: i32,
        spec_id: i32,
        sort_order_id: i32,
    ) -> Self {
        Self::WithGlobalState {
            id: ContentId::generate(),
            content_type: ContentType::IcebergTable,
            on_ref: json!({
                "snapshotId": snapshot_id,
                "schemaId": schema_id,
                "specId": spec_id,
                "sortOrderId": sort_order_id,
            }),
            global: Some(json!({ "metadataLocation": metadata_location.into() })),
        }
    }

    /// A new Delta Lake table. The last checkpoint is global state, the
    /// metadata location history is on-reference state.
    pub fn delta_lake_table(
        metadata_locations: Vec<String>,
        last_checkpoint: Option<String>,
    ) -> Self {
        Self::WithGlobalState {
            id: ContentId::generate(),
            content_type: ContentType::DeltaLakeTable,
            on_ref: json!({ "metadataLocationHistory": metadata_locations }),
            global: Some(json!({ "lastCheckpoint": last_checkpoint })),
        }
    }

    /// A new SQL view.
    pub fn sql_view(sql_text: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self::Simple {
            id: ContentId::generate(),
            content_type: ContentType::View,
            payload: json!({ "sqlText": sql_text.into(), "dialect": dialect.into() }),
        }
    }

    /// A new explicit namespace object.
    pub fn namespace<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements: Vec<String> = elements.into_iter().map(Into::into).collect();
        Self::Simple {
            id: ContentId::generate(),
            content_type: ContentType::Namespace,
            payload: json!({ "elements": elements }),
        }
    }

    /// Replace the content id.
    pub fn with_id(mut self, new_id: ContentId) -> Self {
        match &mut self {
            Self::Simple { id, .. } | Self::WithGlobalState { id, .. } => *id = new_id,
        }
        self
    }

    /// The content id.
    pub fn id(&self) -> &ContentId {
        match self {
            Self::Simple { id, .. } | Self::WithGlobalState { id, .. } => id,
        }
    }

    /// The content type.
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Simple { content_type, .. } | Self::WithGlobalState { content_type, .. } => {
                *content_type
            }
        }
    }

    /// Returns `true` for the global-state variant.
    pub fn has_global_state(&self) -> bool {
        matches!(self, Self::WithGlobalState { .. })
    }

    /// The global value carried by this content, if any.
    pub fn global(&self) -> Option<&Value> {
        match self {
            Self::Simple { .. } => None,
            Self::WithGlobalState { global, .. } => global.as_ref(),
        }
    }

    /// A copy with global state removed; the form persisted in history.
    pub fn without_global(&self) -> Self {
        match self {
            Self::Simple { .. } => self.clone(),
            Self::WithGlobalState {
                id,
                content_type,
                on_ref,
                ..
            } => Self::WithGlobalState {
                id: id.clone(),
                content_type: *content_type,
                on_ref: on_ref.clone(),
                global: None,
            },
        }
    }

    /// A copy with the given global value attached. Simple content is
    /// returned unchanged.
    pub fn with_global_value(&self, value: Option<Value>) -> Self {
        match self {
            Self::Simple { .. } => self.clone(),
            Self::WithGlobalState {
                id,
                content_type,
                on_ref,
                ..
            } => Self::WithGlobalState {
                id: id.clone(),
                content_type: *content_type,
                on_ref: on_ref.clone(),
                global: value,
            },
        }
    }
}
