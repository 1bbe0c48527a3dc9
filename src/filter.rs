// Filter modes for the visible task list

use crate::error::ValidationError;
use crate::task::Task;
use std::str::FromStr;

/// Which tasks are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [FilterMode::All, FilterMode::Active, FilterMode::Completed];

    /// Whether `task` passes this filter
    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !task.completed,
            FilterMode::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "All",
            FilterMode::Active => "Active",
            FilterMode::Completed => "Completed",
        }
    }
}

impl FromStr for FilterMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "active" => Ok(FilterMode::Active),
            "completed" => Ok(FilterMode::Completed),
            _ => Err(ValidationError::InvalidFilter(s.to_string())),
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(completed: bool) -> Task {
        Task {
            id: "t".to_string(),
            text: "x".to_string(),
            completed,
            due_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        }
    }

    #[test]
    fn test_filter_matches() {
        assert!(FilterMode::All.matches(&task(true)));
        assert!(FilterMode::All.matches(&task(false)));
        assert!(FilterMode::Active.matches(&task(false)));
        assert!(!FilterMode::Active.matches(&task(true)));
        assert!(FilterMode::Completed.matches(&task(true)));
        assert!(!FilterMode::Completed.matches(&task(false)));
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("All".parse::<FilterMode>(), Ok(FilterMode::All));
        assert_eq!("active".parse::<FilterMode>(), Ok(FilterMode::Active));
        assert_eq!("COMPLETED".parse::<FilterMode>(), Ok(FilterMode::Completed));
        assert_eq!(
            "done".parse::<FilterMode>(),
            Err(ValidationError::InvalidFilter("done".to_string()))
        );
    }

    #[test]
    fn test_filter_default_and_display() {
        assert_eq!(FilterMode::default(), FilterMode::All);
        assert_eq!(FilterMode::Completed.to_string(), "Completed");
    }
}
