// Task model and due date classification

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "dueDate")]
    pub due_date: NaiveDate,
}

impl Task {
    /// Build a fresh, not yet completed task with a new id.
    ///
    /// Does not validate; see [`validate_input`].
    pub fn new(text: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            completed: false,
            due_date,
        }
    }

    pub fn due_status(&self, today: NaiveDate) -> DueStatus {
        due_status(self.due_date, today)
    }
}

/// Where a due date falls relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
}

/// Classify `due` against `today` at calendar-day granularity
pub fn due_status(due: NaiveDate, today: NaiveDate) -> DueStatus {
    match due.cmp(&today) {
        std::cmp::Ordering::Less => DueStatus::Overdue,
        std::cmp::Ordering::Equal => DueStatus::DueToday,
        std::cmp::Ordering::Greater => DueStatus::Upcoming,
    }
}

/// Check task input and return the trimmed text and due date.
///
/// Checks run in order: empty text, missing date, past date.
pub fn validate_input(
    text: &str,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(String, NaiveDate), ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let due_date = due_date.ok_or(ValidationError::MissingDate)?;
    if due_date < today {
        return Err(ValidationError::PastDate);
    }
    Ok((text.to_string(), due_date))
}

/// Generate a new time-ordered task id
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_status() {
        let today = day(2026, 10, 19);
        assert_eq!(due_status(day(2026, 10, 18), today), DueStatus::Overdue);
        assert_eq!(due_status(day(2026, 10, 19), today), DueStatus::DueToday);
        assert_eq!(due_status(day(2026, 10, 20), today), DueStatus::Upcoming);
        assert_eq!(due_status(day(2025, 12, 31), today), DueStatus::Overdue);
    }

    #[test]
    fn test_validate_input_order() {
        let today = day(2026, 10, 19);
        assert_eq!(validate_input("  ", None, today), Err(ValidationError::EmptyText));
        assert_eq!(validate_input("x", None, today), Err(ValidationError::MissingDate));
        assert_eq!(
            validate_input("x", Some(day(2026, 10, 18)), today),
            Err(ValidationError::PastDate)
        );
        assert_eq!(
            validate_input("  Buy milk ", Some(today), today),
            Ok(("Buy milk".to_string(), today))
        );
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("Buy milk", day(2026, 10, 19));
        assert!(!task.completed);
        assert!(!task.id.is_empty());
        assert_ne!(task.id, Task::new("Buy milk", day(2026, 10, 19)).id);
    }

    #[test]
    fn test_task_serialization() {
        let task = Task {
            id: "t1".to_string(),
            text: "Pay rent".to_string(),
            completed: true,
            due_date: day(2026, 11, 1),
        };

        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(
            json,
            r#"{"id":"t1","text":"Pay rent","completed":true,"dueDate":"2026-11-01"}"#
        );

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_deserialize_rejects_bad_date() {
        let result: Result<Task, _> =
            serde_json::from_str(r#"{"id":"t1","text":"x","completed":false,"dueDate":"2026-13-01"}"#);
        assert!(result.is_err());
    }
}
