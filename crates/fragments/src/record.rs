//! The persisted shape of fragment metadata.
//!
//! A [`FragmentRecord`] is what the gateway stores and hands back. It is not
//! validated; [`crate::Fragment::from_record`] is the only way to turn one into
//! a usable fragment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw fragment metadata as stored.
///
/// `size` stays a raw JSON value so a corrupt record (a string, a negative
/// number) is caught by validation instead of being coerced on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub owner_id: String,

    #[serde(rename = "type", default)]
    pub content_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl FragmentRecord {
    /// A record with only the required fields set.
    pub fn new(owner_id: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            content_type: content_type.into(),
            size: None,
            created: None,
            updated: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<Value>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// One entry of an owner listing: a bare id, or the full record when expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Id(String),
    Record(FragmentRecord),
}
