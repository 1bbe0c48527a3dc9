// Task list state, validation and persistence wiring

use crate::clock::{Clock, SystemClock, parse_due_date};
use crate::error::ValidationError;
use crate::filter::FilterMode;
use crate::storage::Storage;
use crate::task::{DueStatus, Task, validate_input};
use eyre::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Storage key holding the JSON array of tasks
pub const TASKS_KEY: &str = "tasks";

/// Storage key holding the display mode flag
pub const DARK_MODE_KEY: &str = "darkMode";

/// In-progress edit of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: String,
    pub text: String,
    pub due_date: String,
}

/// Pending input for a task that has not been added yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTaskDraft {
    pub text: String,
    pub due_date: String,
}

/// Owns the task list and everything derived from it
pub struct TaskStore<S: Storage> {
    storage: S,
    clock: Box<dyn Clock>,
    tasks: Vec<Task>,
    filter: FilterMode,
    dark_mode: bool,
    editing: Option<EditSession>,
    draft: NewTaskDraft,
}

impl<S: Storage> TaskStore<S> {
    /// Load the store from `storage` using the system clock
    pub fn open(storage: S) -> Self {
        Self::with_clock(storage, Box::new(SystemClock))
    }

    /// Load the store from `storage`, reading "today" from `clock`
    ///
    /// Missing or unreadable data never fails; it yields an empty list and the
    /// default display mode.
    pub fn with_clock(storage: S, clock: Box<dyn Clock>) -> Self {
        let tasks = load_tasks(&storage);
        let dark_mode = load_dark_mode(&storage);

        info!(count = tasks.len(), dark_mode, "Opened task store");

        Self {
            storage,
            clock,
            tasks,
            filter: FilterMode::default(),
            dark_mode,
            editing: None,
            draft: NewTaskDraft::default(),
        }
    }

    /// Save everything one last time and hand back the storage
    pub fn close(mut self) -> Result<S> {
        self.save_tasks().context("Failed to save tasks")?;
        self.save_dark_mode().context("Failed to save display mode")?;
        debug!("Closed task store");
        Ok(self.storage)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// All tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Validate and append a new task, returning its id
    ///
    /// `due_date` must be ISO `YYYY-MM-DD`; blank or malformed values count as missing.
    pub fn add_task(&mut self, text: &str, due_date: Option<&str>) -> Result<String, ValidationError> {
        let due = due_date.and_then(parse_due_date);
        let (text, due_date) = validate_input(text, due, self.today())?;

        let mut task = Task::new(text, due_date);
        while self.get(&task.id).is_some() {
            task = Task::new(task.text, task.due_date);
        }
        let id = task.id.clone();

        debug!(id = %id, due_date = %task.due_date, "add_task: appending");
        self.tasks.push(task);
        self.draft = NewTaskDraft::default();
        self.persist_tasks();

        Ok(id)
    }

    pub fn draft(&self) -> &NewTaskDraft {
        &self.draft
    }

    pub fn set_new_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    pub fn set_new_date(&mut self, due_date: impl Into<String>) {
        self.draft.due_date = due_date.into();
    }

    /// Add a task from the current draft; the draft is kept if validation fails
    pub fn submit_new_task(&mut self) -> Result<String, ValidationError> {
        let NewTaskDraft { text, due_date } = self.draft.clone();
        self.add_task(&text, Some(&due_date))
    }

    /// Flip `completed`; unknown ids are ignored
    pub fn toggle_completed(&mut self, id: &str) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle_completed: no such task");
            return;
        };
        task.completed = !task.completed;
        debug!(id, completed = task.completed, "toggle_completed");
        self.persist_tasks();
    }

    /// Remove a task; unknown ids are ignored
    pub fn delete_task(&mut self, id: &str) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!(id, "delete_task: no such task");
            return;
        }

        if self.editing.as_ref().is_some_and(|e| e.id == id) {
            self.editing = None;
        }
        debug!(id, "delete_task: removed");
        self.persist_tasks();
    }

    /// Remove every completed task, returning how many were removed
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();

        if self.editing.as_ref().is_some_and(|e| self.get(&e.id).is_none()) {
            self.editing = None;
        }

        if removed > 0 {
            info!(removed, "Cleared completed tasks");
            self.persist_tasks();
        }
        removed
    }

    // ========================================================================
    // Editing
    // ========================================================================

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    /// Start editing `id`, replacing any edit already in progress
    pub fn begin_edit(&mut self, id: &str) {
        let Some(task) = self.get(id) else {
            debug!(id, "begin_edit: no such task");
            return;
        };
        self.editing = Some(EditSession {
            id: task.id.clone(),
            text: task.text.clone(),
            due_date: task.due_date.to_string(),
        });
    }

    pub fn set_edit_text(&mut self, text: impl Into<String>) {
        if let Some(editing) = &mut self.editing {
            editing.text = text.into();
        }
    }

    pub fn set_edit_date(&mut self, due_date: impl Into<String>) {
        if let Some(editing) = &mut self.editing {
            editing.due_date = due_date.into();
        }
    }

    /// Apply the edit draft to `id`
    ///
    /// On a validation failure nothing changes and the edit stays open so the
    /// caller can report the error and let the user retry. A task with no open
    /// edit has an empty draft and fails with `EmptyText`.
    pub fn save_edit(&mut self, id: &str) -> Result<(), ValidationError> {
        let Some(editing) = self.editing.as_ref().filter(|e| e.id == id) else {
            debug!(id, "save_edit: task is not being edited");
            return Err(ValidationError::EmptyText);
        };

        let due = parse_due_date(&editing.due_date);
        let (text, due_date) = validate_input(&editing.text, due, self.today())?;

        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.text = text;
            task.due_date = due_date;
            debug!(id, "save_edit: updated");
        }
        self.editing = None;
        self.persist_tasks();

        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    /// Parse and set a filter given by name
    pub fn set_filter_str(&mut self, mode: &str) -> Result<(), ValidationError> {
        self.filter = mode.parse()?;
        Ok(())
    }

    /// Tasks passing the active filter, in insertion order
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> {
        let filter = self.filter;
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    /// Number of unfinished tasks, ignoring the active filter
    pub fn remaining_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    /// Due status of `task` relative to the store's clock
    pub fn due_status(&self, task: &Task) -> DueStatus {
        task.due_status(self.today())
    }

    // ========================================================================
    // Display mode
    // ========================================================================

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode = dark;
        if let Err(e) = self.save_dark_mode() {
            warn!(error = ?e, "Failed to persist display mode");
        }
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.set_dark_mode(!self.dark_mode);
        self.dark_mode
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn persist_tasks(&mut self) {
        if let Err(e) = self.save_tasks() {
            warn!(error = ?e, "Failed to persist tasks, keeping in-memory state");
        }
    }

    fn save_tasks(&mut self) -> Result<()> {
        let json = serialize_tasks(&self.tasks)?;
        self.storage.save(TASKS_KEY, &json)
    }

    fn save_dark_mode(&mut self) -> Result<()> {
        self.storage.save(DARK_MODE_KEY, if self.dark_mode { "true" } else { "false" })
    }
}

/// Encode tasks in the persisted format
pub fn serialize_tasks(tasks: &[Task]) -> Result<String> {
    serde_json::to_string(tasks).context("Failed to serialize tasks")
}

/// Decode tasks from the persisted format
///
/// A document that is not a JSON array yields an error. Entries that do not
/// decode, have blank text or repeat an earlier id are skipped.
pub fn deserialize_tasks(raw: &str) -> Result<Vec<Task>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw).context("Stored tasks are not a JSON array")?;

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let mut task: Task = match serde_json::from_value(entry) {
            Ok(t) => t,
            Err(e) => {
                warn!(index, error = ?e, "Failed to parse stored task, skipping");
                continue;
            }
        };

        if task.text.trim().is_empty() {
            warn!(index, id = %task.id, "Stored task has empty text, skipping");
            continue;
        }
        task.text = task.text.trim().to_string();
        if !seen.insert(task.id.clone()) {
            warn!(index, id = %task.id, "Duplicate task id, skipping");
            continue;
        }

        tasks.push(task);
    }

    Ok(tasks)
}

fn load_tasks<S: Storage>(storage: &S) -> Vec<Task> {
    let raw = match storage.load(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = ?e, "Failed to read stored tasks, starting empty");
            return Vec::new();
        }
    };

    deserialize_tasks(&raw).unwrap_or_else(|e| {
        warn!(error = ?e, "Failed to parse stored tasks, starting empty");
        Vec::new()
    })
}

fn load_dark_mode<S: Storage>(storage: &S) -> bool {
    match storage.load(DARK_MODE_KEY) {
        Ok(Some(raw)) => raw.trim() == "true",
        Ok(None) => false,
        Err(e) => {
            warn!(error = ?e, "Failed to read display mode, using default");
            false
        }
    }
}
