//! Utility functions shared by the CLI and the TUI.
//!
//! Due date parsing and formatting, identifier resolution for the command
//! line, and plain-text table output.

use chrono::{Datelike, Duration, NaiveDate};

use crate::ops::sorted_subtasks;
use crate::task::{SubTask, Todo};
use crate::view::progress;

/// Number of id characters shown in tables.
pub const SHORT_ID_LEN: usize = 8;

/// Abbreviated id for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow"
/// - "monday" .. "sunday" (this week's occurrence), "next friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        // Out-of-range counts are rejected rather than overflowing.
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let (next_week, day) = match s.strip_prefix("next ") {
        Some(day) => (true, day),
        None => (false, s.strip_prefix("this ").unwrap_or(s.as_str())),
    };
    if let Some(&(_, target)) = weekdays.iter().find(|(name, _)| *name == day) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target + 7 - current) % 7;
        let ahead = if next_week { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => match (d - today).num_days() {
            0 => "today".into(),
            1 => "tomorrow".into(),
            n if n > 1 => format!("in {n}d"),
            n => format!("{}d late", -n),
        },
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Resolve a todo by exact id, case-insensitive exact text, or unique id prefix.
pub fn resolve_todo<'a>(identifier: &str, todos: &'a [Todo]) -> Result<&'a Todo, String> {
    let identifier = identifier.trim();
    if let Some(todo) = todos.iter().find(|t| t.id == identifier) {
        return Ok(todo);
    }

    let lowered = identifier.to_lowercase();
    let by_text: Vec<&Todo> = todos.iter().filter(|t| t.text.to_lowercase() == lowered).collect();
    let candidates = if by_text.is_empty() && !identifier.is_empty() {
        todos.iter().filter(|t| t.id.starts_with(identifier)).collect()
    } else {
        by_text
    };

    match candidates.as_slice() {
        [single] => Ok(*single),
        [] => Err(format!("No todo found matching '{identifier}'")),
        _ => {
            let mut msg = format!("Multiple todos match '{identifier}':\n");
            for todo in candidates.iter() {
                msg.push_str(&format!("  {}  {}\n", short_id(&todo.id), todo.text));
            }
            msg.push_str("Please use a longer id instead.");
            Err(msg)
        }
    }
}

/// Resolve a sub-task of `todo` by 1-based position, exact id, exact text, or unique id prefix.
pub fn resolve_subtask<'a>(identifier: &str, todo: &'a Todo) -> Result<&'a SubTask, String> {
    let identifier = identifier.trim();
    let subtasks = sorted_subtasks(todo);
    if let Ok(position) = identifier.parse::<usize>() {
        if let Some(subtask) = position.checked_sub(1).and_then(|i| subtasks.get(i).copied()) {
            return Ok(subtask);
        }
    }
    if let Some(subtask) = subtasks.iter().copied().find(|s| s.id == identifier) {
        return Ok(subtask);
    }

    let lowered = identifier.to_lowercase();
    let by_text: Vec<&SubTask> = subtasks
        .iter()
        .copied()
        .filter(|s| s.text.to_lowercase() == lowered)
        .collect();
    let matches: Vec<&SubTask> = if by_text.is_empty() && !identifier.is_empty() {
        subtasks.iter().copied().filter(|s| s.id.starts_with(identifier)).collect()
    } else {
        by_text
    };
    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(format!("No sub-task of '{}' matches '{identifier}'", todo.text)),
        _ => Err(format!(
            "Multiple sub-tasks of '{}' match '{identifier}'. Use the position instead.",
            todo.text
        )),
    }
}

/// Print todos as a table, optionally followed by their sub-tasks.
pub fn print_table(todos: &[&Todo], today: NaiveDate, with_subtasks: bool) {
    println!(
        "{:<9} {:<4} {:<7} {:<5} {:<10} {:<6} {}",
        "ID", "Done", "Pri", "Cat", "Due", "Steps", "Text"
    );
    for todo in todos {
        let done = if todo.completed { "[x]" } else { "[ ]" };
        let category = todo.category.map_or("-", |c| c.label());
        let steps = progress(todo).map_or_else(|| "-".to_string(), |p| p.to_string());
        println!(
            "{:<9} {:<4} {:<7} {:<5} {:<10} {:<6} {}",
            short_id(&todo.id),
            done,
            todo.priority.label(),
            category,
            format_due_relative(todo.due_date, today),
            steps,
            truncate(&todo.text, 60)
        );
        if with_subtasks {
            for (position, subtask) in sorted_subtasks(todo).into_iter().enumerate() {
                let done = if subtask.completed { "[x]" } else { "[ ]" };
                println!("{:<9} {:<4}   {}. {}", "", done, position + 1, subtask.text);
            }
        }
    }
}
