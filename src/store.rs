// Task store: ordered task list over a persistence slot

use crate::error::TaskError;
use crate::filter::Filter;
use crate::slot::Slot;
use crate::task::{Task, validate_text};
use crate::view::{Notice, View};
use eyre::Context;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Counts shown next to the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// Ordered task list (newest first) persisted to a single slot
pub struct TaskStore<S: Slot> {
    slot: S,
    tasks: Vec<Task>,
    current_filter: Filter,
    views: Vec<Box<dyn View>>,
    persist_error: Option<TaskError>,
}

impl<S: Slot> TaskStore<S> {
    /// Load the store from `slot`
    ///
    /// Missing or unreadable contents give an empty store. Individual records
    /// that break the task invariants are dropped with a warning.
    pub fn open(slot: S) -> Self {
        let tasks = match slot.read() {
            Ok(Some(contents)) => Self::load_snapshot(&contents),
            Ok(None) => {
                debug!(key = slot.key(), "Slot is empty, starting with no tasks");
                Vec::new()
            }
            Err(e) => {
                warn!(key = slot.key(), error = ?e, "Failed to read slot, starting with no tasks");
                Vec::new()
            }
        };

        info!(key = slot.key(), count = tasks.len(), "Loaded tasks");

        Self {
            slot,
            tasks,
            current_filter: Filter::All,
            views: Vec::new(),
            persist_error: None,
        }
    }

    fn load_snapshot(contents: &str) -> Vec<Task> {
        let items = match serde_json::from_str::<Value>(contents) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!("Persisted tasks are not an array, starting with no tasks");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = ?e, "Failed to parse persisted tasks, starting with no tasks");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match check_record(item, &mut seen) {
                Ok(task) => tasks.push(task),
                Err(reason) => warn!(index, reason = %reason, "Skipping invalid persisted task"),
            }
        }
        tasks
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// All tasks in store order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Tasks matching `filter`, in store order
    pub fn filtered(&self, filter: Filter) -> Vec<Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
    }

    /// Tasks matching the current filter
    pub fn visible(&self) -> Vec<Task> {
        self.filtered(self.current_filter)
    }

    pub fn current_filter(&self) -> Filter {
        self.current_filter
    }

    /// Change the view filter and redraw; tasks are not touched
    pub fn set_filter(&mut self, filter: Filter) {
        debug!(filter = %filter, "Filter changed");
        self.current_filter = filter;
        self.refresh();
    }

    /// Draw the visible tasks and counts on every view
    pub fn refresh(&mut self) {
        let visible = self.visible();
        let stats = self.stats();
        for view in &mut self.views {
            view.render(&visible);
            view.update_stats(stats);
        }
    }

    pub fn stats(&self) -> Stats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Stats {
            total: self.tasks.len(),
            active: self.tasks.len() - completed,
            completed,
        }
    }

    /// True while the latest snapshot could not be written
    pub fn is_dirty(&self) -> bool {
        self.persist_error.is_some()
    }

    /// Why the latest snapshot could not be written
    pub fn persist_error(&self) -> Option<&TaskError> {
        self.persist_error.as_ref()
    }

    /// Resolve a full id, or a prefix or suffix matching exactly one task
    pub fn resolve_id(&self, partial: &str) -> Result<String, TaskError> {
        if let Some(task) = self.get(partial) {
            return Ok(task.id.clone());
        }
        if partial.is_empty() {
            return Err(TaskError::NotFound(partial.to_string()));
        }

        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.starts_with(partial) || t.id.ends_with(partial));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id.clone()),
            _ => Err(TaskError::NotFound(partial.to_string())),
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Register a view; it is first drawn by the next refresh or mutation
    pub fn subscribe(&mut self, view: Box<dyn View>) {
        self.views.push(view);
    }

    /// Add a new task at the front of the list
    pub fn add(&mut self, text: &str) -> Result<Task, TaskError> {
        let text = validate_text(text)?;
        let task = Task::new(text);
        debug!(id = %task.id, "Adding task");

        self.tasks.insert(0, task.clone());
        self.commit("Task added successfully!");
        Ok(task)
    }

    /// Flip the completed flag
    pub fn toggle(&mut self, id: &str) -> Result<Task, TaskError> {
        let task = self.find_mut(id)?;
        task.completed = !task.completed;
        task.touch();
        let task = task.clone();
        debug!(id = %task.id, completed = task.completed, "Toggled task");

        let message = if task.completed {
            "Task completed!"
        } else {
            "Task marked as active!"
        };
        self.commit(message);
        Ok(task)
    }

    /// Replace the text; unchanged text is a valid no-op
    pub fn edit(&mut self, id: &str, new_text: &str) -> Result<Task, TaskError> {
        let new_text = validate_text(new_text)?;
        let task = self.find_mut(id)?;
        if task.text == new_text {
            return Ok(task.clone());
        }

        task.text = new_text;
        task.touch();
        let task = task.clone();
        debug!(id = %task.id, "Edited task");

        self.commit("Task updated!");
        Ok(task)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), TaskError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        self.tasks.remove(index);
        debug!(id, "Deleted task");

        self.commit("Task deleted!");
        Ok(())
    }

    /// Remove every completed task in one batch, returning how many went
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();

        if removed == 0 {
            debug!("No completed tasks to clear");
            return 0;
        }

        debug!(removed, "Cleared completed tasks");
        let plural = if removed > 1 { "s" } else { "" };
        self.commit(&format!("{} completed task{} cleared!", removed, plural));
        removed
    }

    /// Replace the whole list from a JSON document
    pub fn import_json(&mut self, json: &str) -> Result<usize, TaskError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| TaskError::InvalidImportFormat(format!("not valid JSON: {}", e)))?;
        self.import_value(value)
    }

    /// Replace the whole list from a parsed JSON value
    ///
    /// The value must be an array of task records with unique ids and valid
    /// text. On any violation the current list is left as it was.
    pub fn import_value(&mut self, value: Value) -> Result<usize, TaskError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(TaskError::InvalidImportFormat(format!(
                    "expected an array of tasks, got {}",
                    json_type_name(&other)
                )));
            }
        };

        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let task = check_record(item, &mut seen)
                .map_err(|reason| TaskError::InvalidImportFormat(format!("task {}: {}", index, reason)))?;
            tasks.push(task);
        }

        let count = tasks.len();
        self.import_all(tasks)?;
        Ok(count)
    }

    /// Replace the whole list with already-built tasks
    pub fn import_all(&mut self, tasks: Vec<Task>) -> Result<(), TaskError> {
        let mut seen = HashSet::new();
        for (index, task) in tasks.iter().enumerate() {
            check_task(task, &mut seen)
                .map_err(|reason| TaskError::InvalidImportFormat(format!("task {}: {}", index, reason)))?;
        }

        let count = tasks.len();
        self.tasks = tasks;
        info!(count, "Imported tasks");

        self.commit(&format!("{} tasks imported!", count));
        Ok(())
    }

    /// Full task list in the persisted representation, pretty-printed
    pub fn export_all(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(&self.tasks).context("Failed to serialize tasks")
    }

    /// Send a notice to every view without changing state
    pub fn notify(&mut self, notice: &Notice) {
        for view in &mut self.views {
            view.show_notice(notice);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn find_mut(&mut self, id: &str) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    /// Persist the snapshot, then redraw every view
    fn commit(&mut self, success: &str) {
        self.persist();

        let visible = self.visible();
        let stats = self.stats();
        let success = Notice::success(success);
        for view in &mut self.views {
            view.render(&visible);
            view.update_stats(stats);
            view.show_notice(&success);
        }

        if self.persist_error.is_some() {
            self.notify(&Notice::error("Failed to save tasks!"));
        }
    }

    /// Write the full snapshot; failure keeps the in-memory list
    fn persist(&mut self) {
        let result = serde_json::to_string(&self.tasks)
            .map_err(eyre::Report::from)
            .and_then(|snapshot| self.slot.write(&snapshot));

        match result {
            Ok(()) => {
                debug!(key = self.slot.key(), count = self.tasks.len(), "Persisted tasks");
                self.persist_error = None;
            }
            Err(e) => {
                error!(key = self.slot.key(), error = ?e, "Failed to persist tasks");
                self.persist_error = Some(TaskError::persistence(&e));
            }
        }
    }
}

/// Deserialize one record and check it against the task invariants
fn check_record(item: Value, seen: &mut HashSet<String>) -> Result<Task, String> {
    let task: Task = serde_json::from_value(item).map_err(|e| format!("not a task record: {}", e))?;
    check_task(&task, seen)?;
    Ok(task)
}

fn check_task(task: &Task, seen: &mut HashSet<String>) -> Result<(), String> {
    if task.id.trim().is_empty() {
        return Err("empty id".to_string());
    }
    match validate_text(&task.text) {
        Ok(text) if text == task.text => {}
        Ok(_) => return Err("text has surrounding whitespace".to_string()),
        Err(e) => return Err(e.to_string()),
    }
    if !seen.insert(task.id.clone()) {
        return Err(format!("duplicate id {}", task.id));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
