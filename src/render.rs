// Terminal rendering of the task list

use crate::storage::Storage;
use crate::store::TaskStore;
use crate::task::{DueStatus, Task};
use chrono::NaiveDate;
use colored::{ColoredString, Colorize};

/// Human readable due date, e.g. "Oct 19, 2026"
pub fn format_due_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn paint_due(text: String, status: DueStatus, dark: bool) -> ColoredString {
    match (status, dark) {
        (DueStatus::Overdue, _) => text.red().bold(),
        (DueStatus::DueToday, true) => text.bright_yellow(),
        (DueStatus::DueToday, false) => text.yellow(),
        (DueStatus::Upcoming, true) => text.bright_cyan(),
        (DueStatus::Upcoming, false) => text.blue(),
    }
}

/// One line for a task. `position` is its 1-based place in the full list.
pub fn render_task(position: usize, task: &Task, status: DueStatus, dark: bool) -> String {
    let checkbox = if task.completed { "[x]" } else { "[ ]" };
    let text = if task.completed {
        task.text.as_str().dimmed().strikethrough()
    } else if dark {
        task.text.as_str().bright_white()
    } else {
        task.text.as_str().normal()
    };
    let due = paint_due(format_due_date(task.due_date), status, dark);

    format!("{:>3}. {} {}  {}", position, checkbox, text, due)
}

/// The visible tasks followed by the remaining count footer
pub fn render_list<S: Storage>(store: &TaskStore<S>) -> String {
    let mut out = String::new();
    let header = format!("To-Do List ({})", store.filter());
    out.push_str(&format!("{}\n", if store.dark_mode() { header.bold().bright_white() } else { header.bold() }));

    let mut shown = 0;
    for (index, task) in store.tasks().iter().enumerate() {
        if !store.filter().matches(task) {
            continue;
        }
        out.push_str(&render_task(index + 1, task, store.due_status(task), store.dark_mode()));
        out.push('\n');
        shown += 1;
    }

    if shown == 0 {
        out.push_str(&format!("{}\n", "No tasks here.".dimmed()));
    }

    out.push_str(&format!("{} task(s) left\n", store.remaining_count()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::filter::FilterMode;
    use crate::storage::MemoryStorage;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_format_due_date() {
        assert_eq!(format_due_date(today()), "Oct 19, 2026");
        assert_eq!(format_due_date(NaiveDate::from_ymd_opt(2027, 1, 5).unwrap()), "Jan 5, 2027");
    }

    #[test]
    fn test_render_task_line() {
        let task = Task {
            id: "t1".to_string(),
            text: "Buy milk".to_string(),
            completed: true,
            due_date: today(),
        };
        let line = render_task(2, &task, DueStatus::DueToday, false);
        assert!(line.contains("2."));
        assert!(line.contains("[x]"));
        assert!(line.contains("Buy milk"));
        assert!(line.contains("Oct 19, 2026"));
    }

    #[test]
    fn test_render_list() {
        let mut store = TaskStore::with_clock(MemoryStorage::new(), Box::new(FixedClock(today())));
        let milk = store.add_task("Buy milk", Some("2026-10-19")).unwrap();
        store.add_task("Pay rent", Some("2026-10-20")).unwrap();
        store.toggle_completed(&milk);

        let out = render_list(&store);
        assert!(out.contains("Buy milk"));
        assert!(out.contains("Pay rent"));
        assert!(out.contains("1 task(s) left"));

        store.set_filter(FilterMode::Active);
        let out = render_list(&store);
        assert!(!out.contains("Buy milk"));
        assert!(out.contains("  2. [ ] "));
    }

    #[test]
    fn test_render_empty_list() {
        let store = TaskStore::with_clock(MemoryStorage::new(), Box::new(FixedClock(today())));
        let out = render_list(&store);
        assert!(out.contains("No tasks here."));
        assert!(out.contains("0 task(s) left"));
    }
}
