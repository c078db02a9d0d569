//! Command implementations for the CLI interface.
//!
//! Each handler resolves the user's identifiers against the current list,
//! calls the matching store operation and prints a one-line result. The
//! operations themselves never fail on bad input; unresolvable identifiers
//! are reported here, before the store is touched.

use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::fields::{Category, Priority, SortKey, StatusFilter};
use crate::ops::{moved_order, sorted_subtasks, Outcome};
use crate::storage::KeyValueStorage;
use crate::store::Store;
use crate::task::NewTodo;
use crate::tui::run::run_tui;
use crate::util::{
    format_due_relative, parse_due_input, print_table, resolve_subtask, resolve_todo, short_id,
};
use crate::view::{derive_view, progress, ViewParams};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI.
    Ui,

    /// Add a new todo.
    Add {
        /// What needs doing.
        text: String,
        /// Priority: high | medium | low.
        #[arg(long, short, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "friday", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Category: work | personal | shopping.
        #[arg(long, short, value_enum)]
        category: Option<Category>,
    },

    /// List todos with optional filters.
    List {
        /// Completion filter.
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Only this category.
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Case-insensitive text search.
        #[arg(long, short)]
        search: Option<String>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Created)]
        sort: SortKey,
        /// Show sub-tasks under each todo.
        #[arg(long)]
        subtasks: bool,
    },

    /// View a single todo and its sub-tasks.
    View {
        /// Todo id, id prefix or text.
        id: String,
    },

    /// Flip a todo between done and not done. Completing also completes its sub-tasks.
    Toggle {
        /// Todo id, id prefix or text.
        id: String,
    },

    /// Replace a todo's text.
    Edit {
        /// Todo id, id prefix or text.
        id: String,
        /// New text.
        text: String,
    },

    /// Delete a todo.
    Delete {
        /// Todo id, id prefix or text.
        id: String,
    },

    /// Manage sub-tasks.
    Sub {
        #[command(subcommand)]
        action: SubAction,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Append a sub-task.
    Add {
        /// Parent todo.
        todo: String,
        /// Sub-task text.
        text: String,
    },
    /// Flip a sub-task between done and not done.
    Toggle {
        /// Parent todo.
        todo: String,
        /// Sub-task position (1-based), id or text.
        sub: String,
    },
    /// Delete a sub-task.
    Delete {
        /// Parent todo.
        todo: String,
        /// Sub-task position (1-based), id or text.
        sub: String,
    },
    /// Set the complete sub-task order.
    Reorder {
        /// Parent todo.
        todo: String,
        /// Sub-tasks in their new order.
        #[arg(required = true)]
        subs: Vec<String>,
        /// Allow sub-tasks left out of the list to be deleted.
        #[arg(long)]
        prune: bool,
    },
    /// Move one sub-task to a new position.
    Move {
        /// Parent todo.
        todo: String,
        /// Sub-task to move.
        sub: String,
        /// Target position (1-based).
        position: usize,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(config: &Config) -> AppResult<()> {
    run_tui(config)
}

/// Add a new todo.
pub fn cmd_add<S: KeyValueStorage>(
    store: &mut Store<S>,
    text: String,
    priority: Priority,
    due: Option<String>,
    category: Option<Category>,
) -> AppResult<()> {
    let mut request = NewTodo::new(text).priority(priority);
    if let Some(raw) = due {
        let today = Local::now().date_naive();
        let date = parse_due_input(&raw, today)
            .ok_or_else(|| AppError::Input(format!("Unrecognised due date '{raw}'")))?;
        request = request.due(date);
    }
    if let Some(category) = category {
        request = request.category(category);
    }

    match store.add_todo(request)? {
        Outcome::Applied => {
            let todos = store.read()?;
            println!("Added todo {}", short_id(&todos[0].id));
        }
        Outcome::Unchanged => println!("Nothing added: text is empty."),
    }
    Ok(())
}

/// List todos through the view pipeline.
pub fn cmd_list<S: KeyValueStorage>(
    store: &mut Store<S>,
    params: &ViewParams,
    with_subtasks: bool,
) -> AppResult<()> {
    let todos = store.read()?;
    let visible = derive_view(todos, params);
    if visible.is_empty() {
        println!("No todos.");
        return Ok(());
    }
    print_table(&visible, Local::now().date_naive(), with_subtasks);
    Ok(())
}

/// View detailed information about one todo.
pub fn cmd_view<S: KeyValueStorage>(store: &mut Store<S>, id: &str) -> AppResult<()> {
    let todos = store.read()?;
    let todo = resolve_todo(id, todos).map_err(AppError::NotFound)?;
    let today = Local::now().date_naive();

    println!("ID:        {}", todo.id);
    println!("Text:      {}", todo.text);
    println!("Done:      {}", if todo.completed { "yes" } else { "no" });
    println!("Priority:  {}", todo.priority.label());
    println!("Category:  {}", todo.category.map_or("-", |c| c.label()));
    match todo.due_date {
        Some(due) => println!("Due:       {} ({})", due, format_due_relative(Some(due), today)),
        None => println!("Due:       -"),
    }
    if let Some(created) = chrono::DateTime::from_timestamp_millis(todo.created_at) {
        println!("Created:   {}", created.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    if let Some(p) = progress(todo) {
        println!("Sub-tasks: {p}");
        for (position, subtask) in sorted_subtasks(todo).into_iter().enumerate() {
            let done = if subtask.completed { "[x]" } else { "[ ]" };
            println!("  {done} {}. {}", position + 1, subtask.text);
        }
    }
    Ok(())
}

/// Flip completion of a todo.
pub fn cmd_toggle<S: KeyValueStorage>(store: &mut Store<S>, id: &str) -> AppResult<()> {
    let id = resolve_todo_id(store, id)?;
    report(store.toggle_todo(&id)?, || {
        format!("Toggled {}", short_id(&id))
    });
    Ok(())
}

/// Replace the text of a todo.
pub fn cmd_edit<S: KeyValueStorage>(store: &mut Store<S>, id: &str, text: &str) -> AppResult<()> {
    let id = resolve_todo_id(store, id)?;
    report(store.edit_todo(&id, text)?, || format!("Updated {}", short_id(&id)));
    Ok(())
}

/// Delete a todo.
pub fn cmd_delete<S: KeyValueStorage>(store: &mut Store<S>, id: &str) -> AppResult<()> {
    let id = resolve_todo_id(store, id)?;
    report(store.delete_todo(&id)?, || format!("Deleted {}", short_id(&id)));
    Ok(())
}

/// Handle sub-task commands.
pub fn cmd_sub<S: KeyValueStorage>(store: &mut Store<S>, action: SubAction) -> AppResult<()> {
    match action {
        SubAction::Add { todo, text } => {
            let todo_id = resolve_todo_id(store, &todo)?;
            report(store.add_subtask(&todo_id, &text)?, || "Added sub-task".to_string());
        }
        SubAction::Toggle { todo, sub } => {
            let (todo_id, sub_id) = resolve_subtask_ids(store, &todo, &sub)?;
            report(store.toggle_subtask(&todo_id, &sub_id)?, || "Toggled sub-task".to_string());
        }
        SubAction::Delete { todo, sub } => {
            let (todo_id, sub_id) = resolve_subtask_ids(store, &todo, &sub)?;
            report(store.delete_subtask(&todo_id, &sub_id)?, || "Deleted sub-task".to_string());
        }
        SubAction::Reorder { todo, subs, prune } => {
            let todos = store.read()?;
            let parent = resolve_todo(&todo, todos).map_err(AppError::NotFound)?;
            let mut ordered = Vec::with_capacity(subs.len());
            for sub in &subs {
                let subtask = resolve_subtask(sub, parent).map_err(AppError::NotFound)?;
                if !ordered.contains(&subtask.id) {
                    ordered.push(subtask.id.clone());
                }
            }
            let omitted = parent.subtasks.len() - ordered.len();
            if omitted > 0 && !prune {
                return Err(AppError::Input(format!(
                    "{omitted} sub-task(s) missing from the new order would be deleted. \
                     List every sub-task, or pass --prune."
                )));
            }
            let todo_id = parent.id.clone();
            report(store.reorder_subtasks(&todo_id, &ordered)?, || "Reordered sub-tasks".to_string());
        }
        SubAction::Move { todo, sub, position } => {
            let todos = store.read()?;
            let parent = resolve_todo(&todo, todos).map_err(AppError::NotFound)?;
            let active = resolve_subtask(&sub, parent).map_err(AppError::NotFound)?;
            let sorted = sorted_subtasks(parent);
            let over = position
                .checked_sub(1)
                .and_then(|i| sorted.get(i))
                .ok_or_else(|| {
                    AppError::Input(format!("Position must be between 1 and {}", sorted.len()))
                })?;
            let todo_id = parent.id.clone();
            let ordered = moved_order(&parent.subtasks, &active.id, &over.id);
            match ordered {
                Some(ordered) => {
                    report(store.reorder_subtasks(&todo_id, &ordered)?, || {
                        format!("Moved sub-task to position {position}")
                    });
                }
                None => println!("Nothing changed."),
            }
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn report<F: FnOnce() -> String>(outcome: Outcome, message: F) {
    match outcome {
        Outcome::Applied => println!("{}", message()),
        Outcome::Unchanged => println!("Nothing changed."),
    }
}

fn resolve_todo_id<S: KeyValueStorage>(store: &mut Store<S>, identifier: &str) -> AppResult<String> {
    let todos = store.read()?;
    let todo = resolve_todo(identifier, todos).map_err(AppError::NotFound)?;
    Ok(todo.id.clone())
}

fn resolve_subtask_ids<S: KeyValueStorage>(
    store: &mut Store<S>,
    todo: &str,
    sub: &str,
) -> AppResult<(String, String)> {
    let todos = store.read()?;
    let parent = resolve_todo(todo, todos).map_err(AppError::NotFound)?;
    let subtask = resolve_subtask(sub, parent).map_err(AppError::NotFound)?;
    Ok((parent.id.clone(), subtask.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::DEFAULT_KEY;

    fn store_with(texts: &[&str]) -> Store<MemoryStorage> {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        for text in texts {
            store.add_todo(NewTodo::new(*text)).unwrap();
        }
        store
    }

    fn subtask_texts(store: &mut Store<MemoryStorage>) -> Vec<String> {
        let todos = store.read().unwrap();
        sorted_subtasks(&todos[0]).iter().map(|s| s.text.clone()).collect()
    }

    #[test]
    fn test_add_parses_due_and_rejects_garbage() {
        let mut store = store_with(&[]);
        cmd_add(&mut store, "pay rent".into(), Priority::High, Some("2026-11-01".into()), None).unwrap();
        let todos = store.read().unwrap();
        assert_eq!(todos[0].due_date.map(|d| d.to_string()).as_deref(), Some("2026-11-01"));

        let err = cmd_add(&mut store, "x".into(), Priority::Low, Some("someday".into()), None);
        assert!(matches!(err, Err(AppError::Input(_))));
        assert_eq!(store.read().unwrap().len(), 1);
    }

    #[test]
    fn test_commands_resolve_by_text() {
        let mut store = store_with(&["laundry", "groceries"]);
        cmd_toggle(&mut store, "Laundry").unwrap();
        cmd_edit(&mut store, "groceries", "groceries and bread").unwrap();
        let todos = store.read().unwrap().to_vec();
        assert!(todos.iter().find(|t| t.text == "laundry").unwrap().completed);
        assert!(todos.iter().any(|t| t.text == "groceries and bread"));

        cmd_delete(&mut store, "laundry").unwrap();
        assert_eq!(store.read().unwrap().len(), 1);
        assert!(matches!(cmd_delete(&mut store, "nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_sub_commands() {
        let mut store = store_with(&["trip"]);
        for text in ["tickets", "hotel", "pack"] {
            cmd_sub(&mut store, SubAction::Add { todo: "trip".into(), text: text.into() }).unwrap();
        }
        cmd_sub(&mut store, SubAction::Move { todo: "trip".into(), sub: "pack".into(), position: 1 }).unwrap();
        assert_eq!(subtask_texts(&mut store), vec!["pack", "tickets", "hotel"]);

        cmd_sub(&mut store, SubAction::Toggle { todo: "trip".into(), sub: "2".into() }).unwrap();
        assert!(store.read().unwrap()[0].subtasks.iter().any(|s| s.text == "tickets" && s.completed));

        cmd_sub(&mut store, SubAction::Delete { todo: "trip".into(), sub: "1".into() }).unwrap();
        assert_eq!(subtask_texts(&mut store), vec!["tickets", "hotel"]);
    }

    #[test]
    fn test_reorder_refuses_partial_list_without_prune() {
        let mut store = store_with(&["trip"]);
        for text in ["a", "b", "c"] {
            cmd_sub(&mut store, SubAction::Add { todo: "trip".into(), text: text.into() }).unwrap();
        }
        let partial = SubAction::Reorder { todo: "trip".into(), subs: vec!["c".into(), "a".into()], prune: false };
        assert!(matches!(cmd_sub(&mut store, partial), Err(AppError::Input(_))));
        assert_eq!(subtask_texts(&mut store), vec!["a", "b", "c"]);

        let full = SubAction::Reorder { todo: "trip".into(), subs: vec!["3".into(), "1".into(), "2".into()], prune: false };
        cmd_sub(&mut store, full).unwrap();
        assert_eq!(subtask_texts(&mut store), vec!["c", "a", "b"]);

        let pruned = SubAction::Reorder { todo: "trip".into(), subs: vec!["b".into()], prune: true };
        cmd_sub(&mut store, pruned).unwrap();
        assert_eq!(subtask_texts(&mut store), vec!["b"]);
    }
}
