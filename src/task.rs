// Task record and input types

use crate::error::{Result, StoreError};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Task priority.
///
/// The three known levels sort `High > Medium > Low`. Anything else is kept
/// verbatim in `Other` so an unrecognized value round-trips through JSON
/// unchanged; all `Other` values rank below `Low` in priority sort and the
/// order among them is unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    Medium,
    Low,
    Other(String),
}

impl Priority {
    /// Ordinal used by priority sort: high=3, medium=2, low=1, other=0.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Other(_) => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other(s) => s,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        // Exact match only; "High" is an unrecognized value, not High.
        match s.as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Other(s),
        }
    }
}

impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        Priority::from(s.to_string())
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single to-do item.
///
/// Wire format is camelCase JSON; `completedAt` and `updatedAt` are omitted
/// entirely when absent rather than serialized as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    /// Due date kept verbatim as supplied; no timezone normalization.
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Calendar day of the due date, if present and parseable.
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.as_deref().and_then(parse_day)
    }

    /// Due date as an instant, if present and parseable.
    /// Date-only values resolve to midnight UTC.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        self.due_date.as_deref().and_then(parse_instant)
    }

    /// A task is overdue when it is not completed and its due date is
    /// strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.due_instant().is_some_and(|due| due < now)
    }
}

/// Parse a due-date string to a calendar day (RFC 3339 or `%Y-%m-%d`).
pub(crate) fn parse_day(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a due-date string to an instant; date-only values are midnight UTC.
pub(crate) fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Input accepted by `TaskStore::create`: either bare text or a structured
/// payload with optional metadata.
#[derive(Debug, Clone)]
pub enum CreateInput {
    Text(String),
    Full {
        text: String,
        priority: Option<Priority>,
        category: Option<String>,
        due_date: Option<String>,
    },
}

impl CreateInput {
    pub(crate) fn into_parts(self) -> (String, Priority, Option<String>, Option<String>) {
        match self {
            CreateInput::Text(text) => (text, Priority::default(), None, None),
            CreateInput::Full {
                text,
                priority,
                category,
                due_date,
            } => (text, priority.unwrap_or_default(), category, due_date),
        }
    }
}

impl From<&str> for CreateInput {
    fn from(s: &str) -> Self {
        CreateInput::Text(s.to_string())
    }
}

impl From<String> for CreateInput {
    fn from(s: String) -> Self {
        CreateInput::Text(s)
    }
}

/// Boundary constructor for untyped JSON payloads. A bare string becomes
/// `Text`; an object must carry a string `text` field (legacy payloads used
/// `task`). Anything else is an invalid argument, not an invalid format.
impl TryFrom<&serde_json::Value> for CreateInput {
    type Error = StoreError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(CreateInput::Text(s.clone())),
            serde_json::Value::Object(map) => {
                let text = map
                    .get("text")
                    .or_else(|| map.get("task"))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        StoreError::InvalidArgument(
                            "task input must carry a string `text` field".to_string(),
                        )
                    })?;
                Ok(CreateInput::Full {
                    text: text.to_string(),
                    priority: map
                        .get("priority")
                        .and_then(|v| v.as_str())
                        .map(Priority::from),
                    category: map
                        .get("category")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    due_date: map
                        .get("dueDate")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                })
            }
            _ => Err(StoreError::InvalidArgument(
                "task input must be a string or an object".to_string(),
            )),
        }
    }
}

/// Partial update applied by `TaskStore::update`; absent fields are left
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
    }
}
