// Search predicates and sorting for task lists

use crate::task::{Priority, Task, parse_day};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Optional match criteria combined with logical AND.
///
/// An absent field imposes no constraint, so the default filter matches
/// every task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Exact completion-state match.
    #[serde(default)]
    pub completed: Option<bool>,
    /// Exact priority match (case-sensitive, verbatim values included).
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Case-insensitive substring match against the category.
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive substring match against the task text.
    #[serde(default)]
    pub text: Option<String>,
    /// Calendar-day equality against the due date, ignoring time-of-day.
    #[serde(default)]
    pub due_date: Option<String>,
}

impl SearchFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }

        if let Some(priority) = &self.priority {
            if &task.priority != priority {
                return false;
            }
        }

        if let Some(category) = &self.category {
            let needle = category.to_lowercase();
            let matched = task
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle));
            if !matched {
                return false;
            }
        }

        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !task.text.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(due) = &self.due_date {
            // An unparseable filter date (or task date) matches nothing.
            let wanted = parse_day(due);
            if wanted.is_none() || task.due_day() != wanted {
                return false;
            }
        }

        true
    }
}

/// Sort key for task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    CompletedAt,
    DueDate,
    Priority,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created" => Ok(SortKey::CreatedAt),
            "updatedAt" | "updated" => Ok(SortKey::UpdatedAt),
            "completedAt" | "completed" => Ok(SortKey::CompletedAt),
            "dueDate" | "due" => Ok(SortKey::DueDate),
            "priority" => Ok(SortKey::Priority),
            _ => Err(format!("unknown sort key: {}", s)),
        }
    }
}

/// Sort direction; descending by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order: {} (expected asc or desc)", s)),
        }
    }
}

/// Sort a task list by the given key and order.
///
/// Date-valued keys treat a missing (or unparseable) value as the epoch;
/// priority maps to its ordinal with unrecognized values at 0. Order among
/// equal keys is unspecified.
pub fn sort_tasks(mut tasks: Vec<Task>, key: SortKey, order: SortOrder) -> Vec<Task> {
    tasks.sort_by_key(|task| sort_value(task, key));
    if order == SortOrder::Desc {
        tasks.reverse();
    }
    tasks
}

fn sort_value(task: &Task, key: SortKey) -> i64 {
    fn millis(ts: Option<DateTime<Utc>>) -> i64 {
        ts.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    match key {
        SortKey::CreatedAt => task.created_at.timestamp_millis(),
        SortKey::UpdatedAt => millis(task.updated_at),
        SortKey::CompletedAt => millis(task.completed_at),
        SortKey::DueDate => millis(task.due_instant()),
        SortKey::Priority => i64::from(task.priority.rank()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(id: u64, text: &str) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed: false,
            priority: Priority::default(),
            category: None,
            due_date: None,
            created_at: Utc.timestamp_millis_opt(1_000 * id as i64).unwrap(),
            completed_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter = SearchFilter::default();
        assert!(filter.matches(&task(1, "anything")));
    }

    #[test]
    fn test_filter_priority_exact() {
        let filter = SearchFilter {
            priority: Some(Priority::High),
            ..Default::default()
        };

        let mut t = task(1, "ship release");
        t.priority = Priority::High;
        assert!(filter.matches(&t));

        t.priority = Priority::Other("High".to_string());
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_filter_text_and_category_case_insensitive() {
        let mut t = task(1, "Buy Groceries");
        t.category = Some("Errands".to_string());

        let filter = SearchFilter {
            text: Some("groceries".to_string()),
            category: Some("errand".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&t));

        let filter = SearchFilter {
            category: Some("work".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_filter_due_date_matches_calendar_day() {
        let mut t = task(1, "file taxes");
        t.due_date = Some("2026-04-15T18:00:00Z".to_string());

        let filter = SearchFilter {
            due_date: Some("2026-04-15".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&t));

        let filter = SearchFilter {
            due_date: Some("2026-04-16".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&t));

        // Unparseable filter date matches nothing, even a dateless task.
        let filter = SearchFilter {
            due_date: Some("someday".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&t));
        assert!(!filter.matches(&task(2, "no due date")));
    }

    #[test]
    fn test_sort_priority_desc() {
        let mut a = task(1, "a");
        a.priority = Priority::Low;
        let mut b = task(2, "b");
        b.priority = Priority::High;
        let mut c = task(3, "c");
        c.priority = Priority::Other("urgent".to_string());
        let mut d = task(4, "d");
        d.priority = Priority::Medium;

        let sorted = sort_tasks(vec![a, b, c, d], SortKey::Priority, SortOrder::Desc);
        let ranks: Vec<u8> = sorted.iter().map(|t| t.priority.rank()).collect();
        assert_eq!(ranks, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_sort_created_at_defaults() {
        let tasks = vec![task(1, "oldest"), task(2, "middle"), task(3, "newest")];

        let sorted = sort_tasks(tasks.clone(), SortKey::default(), SortOrder::default());
        let ids: Vec<u64> = sorted.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let sorted = sort_tasks(tasks, SortKey::CreatedAt, SortOrder::Asc);
        let ids: Vec<u64> = sorted.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_missing_dates_sort_as_epoch() {
        let mut with_due = task(1, "has due");
        with_due.due_date = Some("2026-06-01".to_string());
        let without_due = task(2, "no due");

        let sorted = sort_tasks(
            vec![with_due, without_due],
            SortKey::DueDate,
            SortOrder::Asc,
        );
        assert_eq!(sorted[0].id, 2);
        assert_eq!(sorted[1].id, 1);
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("priority".parse::<SortKey>().unwrap(), SortKey::Priority);
        assert_eq!("dueDate".parse::<SortKey>().unwrap(), SortKey::DueDate);
        assert!("alphabetical".parse::<SortKey>().is_err());
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
    }
}
