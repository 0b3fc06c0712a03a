//! Task and Comment domain types.
//!
//! These mirror the subset of the ClickUp task/comment JSON that the monitor
//! reads. Unknown fields are ignored on deserialization.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a task in the task-tracking service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A snapshot of a task, fetched fresh on every poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Task {
    /// One-line context used when asking the LLM about this task.
    pub fn context_line(&self) -> String {
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("No description");
        format!("{} - {}", self.name, description)
    }
}

/// A comment on a task. Authorship is not tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(rename = "comment_text", default)]
    pub text: String,
}

impl Comment {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// ClickUp returns some ids as strings and some as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
