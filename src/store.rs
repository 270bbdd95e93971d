// In-memory task store: CRUD, search, stats, export/import

use crate::error::{Result, StoreError};
use crate::filter::SearchFilter;
use crate::task::{CreateInput, Priority, Task, TaskPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Version stamped into export payloads.
pub const EXPORT_VERSION: &str = "1.0";

/// Exclusive owner of all task records and the id-issuing counter.
///
/// Every operation is a synchronous, total function over the in-memory
/// state. The store performs no internal locking; a hosting layer serving
/// concurrent callers must serialize access (every mutating operation takes
/// `&mut self`, so the borrow checker enforces exclusive access per call).
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task by id.
    pub fn get(&self, id: u64) -> Result<Option<&Task>> {
        Self::validate_id(id)?;
        Ok(self.tasks.iter().find(|t| t.id == id))
    }

    /// Create a task from bare text or a structured payload.
    ///
    /// Text is trimmed; empty or whitespace-only text is rejected. The new
    /// task gets the next sequential id and is appended in insertion order.
    pub fn create(&mut self, input: impl Into<CreateInput>) -> Result<Task> {
        let (text, priority, category, due_date) = input.into().into_parts();

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(StoreError::InvalidArgument(
                "task text must be a non-empty string".to_string(),
            ));
        }

        let task = Task {
            id: self.issue_id(),
            text,
            completed: false,
            priority,
            category,
            due_date,
            created_at: Utc::now(),
            completed_at: None,
            updated_at: None,
        };

        debug!(id = task.id, "created task");
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Remove a task. Returns whether a matching record existed.
    /// The id counter is not affected; ids are never reused.
    pub fn delete(&mut self, id: u64) -> Result<bool> {
        Self::validate_id(id)?;

        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let deleted = self.tasks.len() < before;
        if deleted {
            debug!(id, "deleted task");
        }
        Ok(deleted)
    }

    /// Mark a task completed, stamping `completed_at`. Repeating the call
    /// re-stamps the timestamp; nothing else changes.
    pub fn complete(&mut self, id: u64) -> Result<Option<Task>> {
        Self::validate_id(id)?;

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.completed = true;
        task.completed_at = Some(Utc::now());
        debug!(id, "completed task");
        Ok(Some(task.clone()))
    }

    /// Mark a task not completed, removing `completed_at` entirely.
    pub fn uncomplete(&mut self, id: u64) -> Result<Option<Task>> {
        Self::validate_id(id)?;

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.completed = false;
        task.completed_at = None;
        debug!(id, "uncompleted task");
        Ok(Some(task.clone()))
    }

    /// Apply a partial update. Only fields present in the patch change;
    /// `text` and `category` are trimmed. `updated_at` is stamped on every
    /// successful update, including a no-op patch.
    pub fn update(&mut self, id: u64, patch: TaskPatch) -> Result<Option<Task>> {
        Self::validate_id(id)?;

        if let Some(text) = &patch.text {
            if text.trim().is_empty() {
                return Err(StoreError::InvalidArgument(
                    "task text must be a non-empty string".to_string(),
                ));
            }
        }

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(text) = patch.text {
            task.text = text.trim().to_string();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(category) = patch.category {
            task.category = Some(category.trim().to_string());
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Some(Utc::now());

        debug!(id, "updated task");
        Ok(Some(task.clone()))
    }

    /// Return tasks matching every provided predicate, in insertion order.
    pub fn search(&self, filter: &SearchFilter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Aggregate statistics over the current state.
    pub fn stats(&self) -> TaskStats {
        let now = Utc::now();
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();

        let mut priority_stats = PriorityStats::default();
        for task in &self.tasks {
            match task.priority {
                Priority::High => priority_stats.high += 1,
                Priority::Medium => priority_stats.medium += 1,
                Priority::Low => priority_stats.low += 1,
                Priority::Other(_) => {}
            }
        }

        let mut category_stats: BTreeMap<String, usize> = BTreeMap::new();
        for task in &self.tasks {
            if let Some(category) = &task.category {
                *category_stats.entry(category.clone()).or_insert(0) += 1;
            }
        }

        let completion_rate = if total > 0 {
            format!("{:.2}", completed as f64 / total as f64 * 100.0)
        } else {
            "0.00".to_string()
        };

        TaskStats {
            total,
            completed,
            pending: total - completed,
            overdue: self.tasks.iter().filter(|t| t.is_overdue(now)).count(),
            completion_rate,
            priority_stats,
            category_stats,
        }
    }

    /// Distinct non-null categories, case-sensitive, sorted ascending.
    pub fn categories(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter_map(|t| t.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Snapshot the full task list as a versioned export document.
    pub fn export(&self) -> ExportPayload {
        ExportPayload {
            tasks: self.tasks.clone(),
            exported_at: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Import tasks from a JSON document string. See [`Self::import_value`].
    pub fn import(&mut self, data: &str, merge: bool) -> Result<ImportSummary> {
        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| StoreError::InvalidFormat(format!("payload is not valid JSON: {}", e)))?;
        self.import_value(value, merge)
    }

    /// Import tasks from a parsed JSON value.
    ///
    /// The payload must be an object with a `tasks` array. Elements lacking
    /// a non-empty string text (or not deserializing at all) are skipped and
    /// counted, never aborting the import. With `merge` false the store is
    /// cleared and the counter reset before importing; a positive id in the
    /// source is then honored, advancing the counter past it. With `merge`
    /// true every imported record gets a freshly issued id.
    pub fn import_value(&mut self, value: serde_json::Value, merge: bool) -> Result<ImportSummary> {
        let envelope: ImportEnvelope = serde_json::from_value(value)
            .map_err(|e| StoreError::InvalidFormat(format!("payload must carry a tasks array: {}", e)))?;

        if !merge {
            self.reset();
        }

        let total = envelope.tasks.len();
        let mut imported = 0;
        let mut skipped = 0;

        for element in envelope.tasks {
            let raw: RawTask = match serde_json::from_value(element) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "skipping malformed task record");
                    skipped += 1;
                    continue;
                }
            };

            let Some(text) = raw.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
                warn!("skipping task record with missing or empty text");
                skipped += 1;
                continue;
            };
            let text = text.to_string();

            let id = match raw.id.filter(|&id| id > 0) {
                Some(id) if !merge => self.honor_id(id),
                _ => self.issue_id(),
            };

            self.tasks.push(Task {
                id,
                text,
                completed: raw.completed.unwrap_or(false),
                priority: raw.priority.unwrap_or_default(),
                category: raw.category,
                due_date: raw.due_date,
                created_at: raw.created_at.unwrap_or_else(Utc::now),
                completed_at: raw.completed_at,
                updated_at: raw.updated_at,
            });
            imported += 1;
        }

        info!(imported, skipped, total, merge, "imported tasks");
        Ok(ImportSummary {
            imported,
            skipped,
            total,
        })
    }

    /// Remove every completed task, preserving the order of the rest.
    /// Returns the number removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            debug!(removed, "cleared completed tasks");
        }
        removed
    }

    /// Empty the store and reset the id counter to 1.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.next_id = 1;
    }

    fn issue_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Keep the counter strictly above every id present in the store,
    /// including ids honored from an import payload.
    fn honor_id(&mut self, id: u64) -> u64 {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        id
    }

    fn validate_id(id: u64) -> Result<()> {
        if id == 0 {
            return Err(StoreError::InvalidArgument(
                "id must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts per known priority bucket. Unrecognized priorities fall in none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityStats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregated view of the store, produced by [`TaskStore::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Percentage of completed tasks, formatted to two decimal places.
    pub completion_rate: String,
    pub priority_stats: PriorityStats,
    pub category_stats: BTreeMap<String, usize>,
}

/// Versioned export document produced by [`TaskStore::export`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub tasks: Vec<Task>,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// Outcome of an import: per-record failures are counted, not fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Typed boundary for the import envelope; anything not carrying a `tasks`
/// array fails wholesale with `InvalidFormat`.
#[derive(Debug, Deserialize)]
struct ImportEnvelope {
    tasks: Vec<serde_json::Value>,
}

/// Per-record intermediate for import. Every field is optional so one bad
/// record can be skipped without aborting the batch; `task` is accepted as
/// a legacy alias for `text`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default, alias = "task")]
    text: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}
