use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Niedrig",
            Priority::Medium => "Mittel",
            Priority::High => "Hoch",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidPriority(other.to_string())),
        }
    }
}

/// One entry of the task list, in the shape it is persisted.
///
/// `priority` and `created_at` are kept exactly as loaded, whatever their
/// JSON type: a record written by an older version may lack them or carry
/// odd values, and neither is validated or backfilled on load. Use
/// [`Task::effective_priority`] for display and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    pub text: String,

    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Value>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Task {
    pub fn new_open(text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: new_task_id(),
            text,
            done: false,
            priority: Some(Priority::Medium.as_str().into()),
            created_at: Some(now.timestamp_millis().into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = Some(priority.as_str().into());
    }

    /// Whether a raw JSON element carries the fields every task needs.
    pub fn has_required_shape(value: &Value) -> bool {
        let Some(obj) = value.as_object() else {
            return false;
        };
        obj.get("id").is_some_and(Value::is_string)
            && obj.get("text").is_some_and(Value::is_string)
            && obj.get("done").is_some_and(Value::is_boolean)
    }
}

pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
