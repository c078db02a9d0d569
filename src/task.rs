//! Todo data structures.
//!
//! This module defines the `Todo` record, its owned `SubTask` list, and the
//! `NewTodo` request used to create one. Field names follow the persisted JSON
//! layout exactly, so these types double as the storage schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::{Category, Priority};

/// A single todo with optional due date, category and ordered sub-tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
}

/// A step of a todo. Only ever reached through its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Position among siblings; siblings always hold `0..n`.
    pub order: usize,
}

/// Everything needed to create a todo. Only `text` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub text: String,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<Category>,
}

impl NewTodo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

impl Todo {
    /// Build a fresh, incomplete todo. Returns `None` when the text is blank.
    pub fn create(request: NewTodo, created_at: i64) -> Option<Self> {
        let text = request.text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Todo {
            id: new_id(),
            text: text.to_string(),
            completed: false,
            priority: request.priority.unwrap_or_default(),
            created_at,
            due_date: request.due_date,
            category: request.category,
            subtasks: Vec::new(),
        })
    }
}

impl SubTask {
    /// Build a fresh, incomplete sub-task at `order`. Returns `None` when the text is blank.
    pub fn create(text: &str, order: usize) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(SubTask {
            id: new_id(),
            text: text.to_string(),
            completed: false,
            order,
        })
    }
}

/// Generate an opaque unique identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_trims_and_defaults() {
        let todo = Todo::create(NewTodo::new("  shopping  "), 42).unwrap();
        assert_eq!(todo.text, "shopping");
        assert!(!todo.completed);
        assert_eq!(todo.priority, Priority::Medium);
        assert_eq!(todo.created_at, 42);
        assert!(todo.subtasks.is_empty());
        assert!(Todo::create(NewTodo::new("   "), 42).is_none());
    }

    #[test]
    fn test_optional_fields_are_omitted_from_json() {
        let todo = Todo::create(NewTodo::new("plain"), 1).unwrap();
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json.get("dueDate").is_none());
        assert!(json.get("category").is_none());
        assert_eq!(json["createdAt"], 1);
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["subtasks"], serde_json::json!([]));
    }

    #[test]
    fn test_due_date_and_category_use_persisted_layout() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let todo = Todo::create(
            NewTodo::new("report").due(due).category(Category::Work).priority(Priority::High),
            1,
        )
        .unwrap();
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["dueDate"], "2026-03-20");
        assert_eq!(json["category"], "업무");
        assert_eq!(json["priority"], "high");
    }

    #[test]
    fn test_legacy_record_without_priority_or_subtasks() {
        let raw = r#"{"id":"a","text":"old","completed":true,"createdAt":5}"#;
        let todo: Todo = serde_json::from_str(raw).unwrap();
        assert_eq!(todo.priority, Priority::Medium);
        assert!(todo.subtasks.is_empty());
        assert!(todo.due_date.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_id(), new_id());
        assert!(SubTask::create("\t", 0).is_none());
        assert_eq!(SubTask::create(" step ", 3).unwrap().order, 3);
    }
}
