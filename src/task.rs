// Task record and text validation

use crate::error::TaskError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum task text length, in characters, after trimming
pub const MAX_TEXT_LEN: usize = 100;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new active task from already-validated text
    pub(crate) fn new(text: String) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            text,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`, never moving it backwards or leaving it unchanged
    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }

    /// Last eight characters of the id, for display
    ///
    /// The leading characters of a v7 id encode the creation time, so tasks
    /// added close together share them; the tail is random.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().rev().nth(7) {
            Some((idx, _)) => &self.id[idx..],
            None => &self.id,
        }
    }
}

/// Fresh time-ordered task id
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Trim `raw` and check it is 1..=MAX_TEXT_LEN characters
pub fn validate_text(raw: &str) -> Result<String, TaskError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(TaskError::EmptyText);
    }

    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(TaskError::TooLong { len, max: MAX_TEXT_LEN });
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_trims() {
        assert_eq!(validate_text("  buy milk \n").unwrap(), "buy milk");
    }

    #[test]
    fn test_validate_text_empty() {
        assert_eq!(validate_text(""), Err(TaskError::EmptyText));
        assert_eq!(validate_text("   \t"), Err(TaskError::EmptyText));
    }

    #[test]
    fn test_validate_text_length_bounds() {
        assert!(validate_text(&"a".repeat(100)).is_ok());
        assert_eq!(
            validate_text(&"a".repeat(101)),
            Err(TaskError::TooLong { len: 101, max: 100 })
        );
        // Surrounding whitespace does not count
        assert!(validate_text(&format!("  {}  ", "a".repeat(100))).is_ok());
    }

    #[test]
    fn test_validate_text_counts_chars_not_bytes() {
        let text = "é".repeat(100);
        assert!(text.len() > 100);
        assert!(validate_text(&text).is_ok());
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("write spec".to_string());
        assert_eq!(task.text, "write spec");
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
        assert!(!task.id.is_empty());
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_touch_strictly_increases() {
        let mut task = Task::new("x".to_string());
        // Put the timestamp in the future so the clock cannot overtake it
        task.updated_at = Utc::now() + Duration::hours(1);
        let before = task.updated_at;
        task.touch();
        assert!(task.updated_at > before);
        assert_eq!(task.updated_at - before, Duration::milliseconds(1));
    }

    #[test]
    fn test_task_serialization_camel_case() {
        let task = Task::new("buy milk".to_string());
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"completed\":false"));

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_deserialize_millisecond_timestamps() {
        let json = r#"{"id":"lq2k3j9x","text":"walk dog","completed":true,
            "createdAt":"2024-05-01T10:00:00.000Z","updatedAt":"2024-05-01T11:30:00.000Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "lq2k3j9x");
        assert!(task.completed);
        assert!(task.updated_at > task.created_at);
    }

    #[test]
    fn test_short_id() {
        let mut task = Task::new("x".to_string());
        assert_eq!(task.short_id().len(), 8);
        assert!(task.id.ends_with(task.short_id()));
        task.id = "abc".to_string();
        assert_eq!(task.short_id(), "abc");
    }
}
