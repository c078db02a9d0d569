//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TodoList,
    AddTodo,
    EditTodo,
    AddSubtask,
    Search,
    Help,
    Confirm,
}

impl AppState {
    /// Whether keystrokes go to the text input.
    pub fn takes_text(self) -> bool {
        matches!(
            self,
            AppState::AddTodo | AppState::EditTodo | AppState::AddSubtask | AppState::Search
        )
    }
}

/// One line of the todo table: a todo, or a sub-task of an expanded todo.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ListRow {
    Todo { todo_id: String },
    Subtask { todo_id: String, subtask_id: String },
}

impl ListRow {
    /// Id of the todo this row belongs to.
    pub fn todo_id(&self) -> &str {
        match self {
            ListRow::Todo { todo_id } | ListRow::Subtask { todo_id, .. } => todo_id,
        }
    }
}
