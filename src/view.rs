//! View derivation: from the stored collection to the rows on screen.
//!
//! Nothing here is persisted. The list shown to the user is recomputed from
//! scratch whenever the collection or a view parameter changes, applying the
//! status filter, category filter, search and sort in that order.

use std::cmp::Ordering;

use crate::fields::{CategoryFilter, SortKey, StatusFilter};
use crate::task::Todo;

/// User-selected view parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub search: String,
    pub sort: SortKey,
}

/// Sub-task completion of one todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Progress of `todo`, or `None` when it has no sub-tasks.
pub fn progress(todo: &Todo) -> Option<Progress> {
    if todo.subtasks.is_empty() {
        return None;
    }
    Some(Progress {
        completed: todo.subtasks.iter().filter(|s| s.completed).count(),
        total: todo.subtasks.len(),
    })
}

/// The todos to display, in display order.
///
/// An empty result means either "no todos" or "everything filtered out";
/// both render the same placeholder.
pub fn derive_view<'a>(todos: &'a [Todo], params: &ViewParams) -> Vec<&'a Todo> {
    let query = params.search.to_lowercase();
    let mut visible: Vec<&Todo> = todos
        .iter()
        .filter(|t| matches_status(t, params.status))
        .filter(|t| matches_category(t, params.category))
        .filter(|t| query.is_empty() || t.text.to_lowercase().contains(&query))
        .collect();
    sort_todos(&mut visible, params.sort);
    visible
}

pub fn matches_status(todo: &Todo, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Active => !todo.completed,
        StatusFilter::Completed => todo.completed,
    }
}

pub fn matches_category(todo: &Todo, category: CategoryFilter) -> bool {
    match category {
        CategoryFilter::All => true,
        CategoryFilter::Only(label) => todo.category == Some(label),
    }
}

/// Stable sort; ties keep their incoming order.
pub fn sort_todos(todos: &mut [&Todo], key: SortKey) {
    match key {
        SortKey::Created => todos.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Text => todos.sort_by(|a, b| compare_text(&a.text, &b.text)),
        SortKey::Due => todos.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
}

/// Collation for natural-language todo text.
///
/// Symbols and digits sort first, then Hangul (whose code point order is
/// dictionary order), then Han, then all other scripts. Letters compare
/// case-insensitively.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let keys = |s: &str| {
        s.chars()
            .flat_map(char::to_lowercase)
            .map(|c| (script_group(c), c))
            .collect::<Vec<_>>()
    };
    keys(a).cmp(&keys(b))
}

fn script_group(c: char) -> u8 {
    match c {
        '\u{1100}'..='\u{11FF}'
        | '\u{3130}'..='\u{318F}'
        | '\u{A960}'..='\u{A97F}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{D7B0}'..='\u{D7FF}' => 1,
        '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' => 2,
        c if c.is_alphabetic() => 3,
        _ => 0,
    }
}
