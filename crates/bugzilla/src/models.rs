//! Bugzilla data models.
//!
//! Field names follow the Bugzilla REST API (`/rest/bug`). Timestamps are kept
//! as the raw RFC 3339 strings the API returns; callers decide how to treat a
//! value that fails to parse.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bug priority.
///
/// Values the operator reasons about get their own variant. Anything else is
/// carried through unchanged so an update never rewrites an unknown priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    Unspecified,
    /// Priority value not known to the operator.
    Other(String),
}

impl Priority {
    /// Get the wire representation of this priority.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unspecified => "unspecified",
            Self::Other(value) => value,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl From<&str> for Priority {
    fn from(value: &str) -> Self {
        match value {
            "urgent" => Self::Urgent,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            "unspecified" => Self::Unspecified,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flag set on a bug (`needinfo?`, `blocker+`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    /// One of `?`, `+`, `-`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requestee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
}

/// A bug as returned by search or by a direct fetch.
///
/// Search results only carry the fields requested through
/// `include_fields`, so anything may come back empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bug {
    pub id: u64,
    pub summary: String,
    pub status: String,
    pub severity: String,
    pub priority: Priority,
    pub creation_time: String,
    pub last_change_time: String,
    pub assigned_to: String,
    pub creator: String,
    pub whiteboard: String,
    #[serde(rename = "cf_devel_whiteboard")]
    pub devel_whiteboard: String,
    pub component: Vec<String>,
    pub keywords: Vec<String>,
    pub flags: Vec<Flag>,
}

impl Bug {
    /// Check whether the bug carries flag `name` with the given status.
    #[must_use]
    pub fn has_flag(&self, name: &str, status: &str) -> bool {
        self.flags
            .iter()
            .any(|flag| flag.name == name && flag.status == status)
    }
}

/// A comment on a bug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Position of the comment on the bug (0 is the description).
    pub count: u32,
    pub text: String,
    pub time: String,
    pub creator: String,
}

/// One field delta inside a history record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDelta {
    pub field_name: String,
    pub removed: String,
    pub added: String,
}

/// A history record: every field changed by one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryChange {
    pub when: String,
    pub who: String,
    pub changes: Vec<FieldDelta>,
}

/// A flag change sent as part of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagChange {
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requestee: Option<String>,
}

/// A comment added as part of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugComment {
    pub body: String,
}

/// Payload for `PUT /rest/bug/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BugUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whiteboard: Option<String>,
    #[serde(
        rename = "cf_devel_whiteboard",
        skip_serializing_if = "Option::is_none"
    )]
    pub devel_whiteboard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<BugComment>,
    /// Suppress e-mail notifications for this change.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub minor_update: bool,
}
