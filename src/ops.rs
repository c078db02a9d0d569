//! Mutation operations on the todo collection.
//!
//! Each operation comes in two layers. A pure function takes the current
//! collection and returns the next one, or `None` when the input is invalid
//! (blank text, unknown id) and nothing should change. The matching `Store`
//! method reads fresh, applies the pure function and writes the result back,
//! so callers never hold a stale snapshot across mutations.

use chrono::Utc;

use crate::error::StoreResult;
use crate::storage::KeyValueStorage;
use crate::store::Store;
use crate::task::{NewTodo, SubTask, Todo};

/// Whether a mutation was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Unchanged,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// Prepend `todo`.
pub fn add_todo(todos: &[Todo], todo: Todo) -> Vec<Todo> {
    let mut next = Vec::with_capacity(todos.len() + 1);
    next.push(todo);
    next.extend_from_slice(todos);
    next
}

/// Flip completion. Completing a todo completes all of its sub-tasks;
/// reopening it leaves them as they are.
pub fn toggle_todo(todos: &[Todo], id: &str) -> Option<Vec<Todo>> {
    update_todo(todos, id, |todo| {
        todo.completed = !todo.completed;
        if todo.completed {
            for subtask in &mut todo.subtasks {
                subtask.completed = true;
            }
        }
    })
}

pub fn delete_todo(todos: &[Todo], id: &str) -> Option<Vec<Todo>> {
    if !todos.iter().any(|t| t.id == id) {
        return None;
    }
    Some(todos.iter().filter(|t| t.id != id).cloned().collect())
}

/// Replace the text. Blank text leaves the todo untouched.
pub fn edit_todo(todos: &[Todo], id: &str, text: &str) -> Option<Vec<Todo>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    update_todo(todos, id, |todo| todo.text = text.to_string())
}

/// Append a sub-task at the end of the parent's list.
pub fn add_subtask(todos: &[Todo], todo_id: &str, text: &str) -> Option<Vec<Todo>> {
    let position = todos.iter().position(|t| t.id == todo_id)?;
    let subtask = SubTask::create(text, todos[position].subtasks.len())?;
    let mut next = todos.to_vec();
    next[position].subtasks.push(subtask);
    Some(next)
}

/// Flip one sub-task. The parent's own completion is never touched.
pub fn toggle_subtask(todos: &[Todo], todo_id: &str, subtask_id: &str) -> Option<Vec<Todo>> {
    let (position, index) = locate_subtask(todos, todo_id, subtask_id)?;
    let mut next = todos.to_vec();
    let subtask = &mut next[position].subtasks[index];
    subtask.completed = !subtask.completed;
    Some(next)
}

/// Remove one sub-task and renumber the rest `0..n` in their prior order.
pub fn delete_subtask(todos: &[Todo], todo_id: &str, subtask_id: &str) -> Option<Vec<Todo>> {
    let (position, index) = locate_subtask(todos, todo_id, subtask_id)?;
    let mut next = todos.to_vec();
    let subtasks = &mut next[position].subtasks;
    subtasks.remove(index);
    subtasks.sort_by_key(|s| s.order);
    for (order, subtask) in subtasks.iter_mut().enumerate() {
        subtask.order = order;
    }
    Some(next)
}

/// Replace the sub-tasks with those named in `ordered_ids`, in that order.
///
/// Unknown ids are skipped and repeated ids are placed once. Existing
/// sub-tasks missing from `ordered_ids` are dropped.
pub fn reorder_subtasks(todos: &[Todo], todo_id: &str, ordered_ids: &[String]) -> Option<Vec<Todo>> {
    let position = todos.iter().position(|t| t.id == todo_id)?;
    let mut next = todos.to_vec();
    let todo = &mut next[position];

    let mut remaining = std::mem::take(&mut todo.subtasks);
    let mut reordered = Vec::with_capacity(remaining.len());
    for id in ordered_ids {
        if let Some(index) = remaining.iter().position(|s| &s.id == id) {
            let mut subtask = remaining.swap_remove(index);
            subtask.order = reordered.len();
            reordered.push(subtask);
        }
    }
    if !remaining.is_empty() {
        tracing::warn!(
            todo_id,
            dropped = remaining.len(),
            "Sub-tasks omitted from reorder were removed"
        );
    }
    todo.subtasks = reordered;
    Some(next)
}

/// Sub-tasks in display order.
pub fn sorted_subtasks(todo: &Todo) -> Vec<&SubTask> {
    let mut subtasks: Vec<&SubTask> = todo.subtasks.iter().collect();
    subtasks.sort_by_key(|s| s.order);
    subtasks
}

/// Id order after dragging `active_id` onto `over_id`.
///
/// Returns `None` when the drop changes nothing or either id is unknown.
pub fn moved_order(subtasks: &[SubTask], active_id: &str, over_id: &str) -> Option<Vec<String>> {
    if active_id == over_id {
        return None;
    }
    let mut sorted: Vec<&SubTask> = subtasks.iter().collect();
    sorted.sort_by_key(|s| s.order);
    let from = sorted.iter().position(|s| s.id == active_id)?;
    let to = sorted.iter().position(|s| s.id == over_id)?;
    let moved = sorted.remove(from);
    sorted.insert(to, moved);
    Some(sorted.into_iter().map(|s| s.id.clone()).collect())
}

fn update_todo<F>(todos: &[Todo], id: &str, apply: F) -> Option<Vec<Todo>>
where
    F: FnOnce(&mut Todo),
{
    let position = todos.iter().position(|t| t.id == id)?;
    let mut next = todos.to_vec();
    apply(&mut next[position]);
    Some(next)
}

fn locate_subtask(todos: &[Todo], todo_id: &str, subtask_id: &str) -> Option<(usize, usize)> {
    let position = todos.iter().position(|t| t.id == todo_id)?;
    let index = todos[position]
        .subtasks
        .iter()
        .position(|s| s.id == subtask_id)?;
    Some((position, index))
}

impl<S: KeyValueStorage> Store<S> {
    /// Read fresh, apply `mutate`, and write the result if there is one.
    fn commit<F>(&mut self, mutate: F) -> StoreResult<Outcome>
    where
        F: FnOnce(&[Todo]) -> Option<Vec<Todo>>,
    {
        let next = mutate(self.read()?);
        match next {
            Some(next) => {
                self.write(next)?;
                Ok(Outcome::Applied)
            }
            None => Ok(Outcome::Unchanged),
        }
    }

    /// Create a todo at the front of the list. Blank text is a no-op.
    pub fn add_todo(&mut self, request: NewTodo) -> StoreResult<Outcome> {
        let Some(todo) = Todo::create(request, Utc::now().timestamp_millis()) else {
            return Ok(Outcome::Unchanged);
        };
        let id = todo.id.clone();
        let outcome = self.commit(|todos| Some(add_todo(todos, todo)))?;
        if outcome.is_applied() {
            tracing::debug!(id = %id, "Todo added");
        }
        Ok(outcome)
    }

    pub fn toggle_todo(&mut self, id: &str) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| toggle_todo(todos, id))?;
        if outcome.is_applied() {
            tracing::debug!(id, "Todo toggled");
        }
        Ok(outcome)
    }

    pub fn delete_todo(&mut self, id: &str) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| delete_todo(todos, id))?;
        if outcome.is_applied() {
            tracing::debug!(id, "Todo deleted");
        }
        Ok(outcome)
    }

    pub fn edit_todo(&mut self, id: &str, text: &str) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| edit_todo(todos, id, text))?;
        if outcome.is_applied() {
            tracing::debug!(id, "Todo text updated");
        }
        Ok(outcome)
    }

    pub fn add_subtask(&mut self, todo_id: &str, text: &str) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| add_subtask(todos, todo_id, text))?;
        if outcome.is_applied() {
            tracing::debug!(todo_id, "Sub-task added");
        }
        Ok(outcome)
    }

    pub fn toggle_subtask(&mut self, todo_id: &str, subtask_id: &str) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| toggle_subtask(todos, todo_id, subtask_id))?;
        if outcome.is_applied() {
            tracing::debug!(todo_id, subtask_id, "Sub-task toggled");
        }
        Ok(outcome)
    }

    pub fn delete_subtask(&mut self, todo_id: &str, subtask_id: &str) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| delete_subtask(todos, todo_id, subtask_id))?;
        if outcome.is_applied() {
            tracing::debug!(todo_id, subtask_id, "Sub-task deleted");
        }
        Ok(outcome)
    }

    pub fn reorder_subtasks(&mut self, todo_id: &str, ordered_ids: &[String]) -> StoreResult<Outcome> {
        let outcome = self.commit(|todos| reorder_subtasks(todos, todo_id, ordered_ids))?;
        if outcome.is_applied() {
            tracing::debug!(todo_id, count = ordered_ids.len(), "Sub-tasks reordered");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::fields::{Category, Priority};
    use crate::storage::MemoryStorage;
    use crate::store::DEFAULT_KEY;

    fn store() -> Store<MemoryStorage> {
        Store::new(MemoryStorage::new(), DEFAULT_KEY)
    }

    /// A store holding one todo with the given sub-tasks; returns its id.
    fn store_with_subtasks(texts: &[&str]) -> (Store<MemoryStorage>, String) {
        let mut store = store();
        store.add_todo(NewTodo::new("parent")).unwrap();
        let id = store.read().unwrap()[0].id.clone();
        for text in texts {
            store.add_subtask(&id, text).unwrap();
        }
        (store, id)
    }

    fn snapshot(store: &mut Store<MemoryStorage>) -> Vec<Todo> {
        store.read().unwrap().to_vec()
    }

    fn assert_contiguous(todo: &Todo) {
        let mut orders: Vec<usize> = todo.subtasks.iter().map(|s| s.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, (0..todo.subtasks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_add_todo_prepends_with_defaults() {
        let mut store = store();
        assert_eq!(store.add_todo(NewTodo::new("shopping")).unwrap(), Outcome::Applied);
        store
            .add_todo(NewTodo::new(" report ").priority(Priority::High).category(Category::Work))
            .unwrap();

        let todos = snapshot(&mut store);
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].text, "report");
        assert_eq!(todos[0].priority, Priority::High);
        assert_eq!(todos[0].category, Some(Category::Work));
        assert_eq!(todos[1].text, "shopping");
        assert_eq!(todos[1].priority, Priority::Medium);
        assert!(!todos[1].completed);
        assert!(todos[1].due_date.is_none());
        assert!(todos[1].category.is_none());
    }

    #[test]
    fn test_blank_input_is_a_silent_no_op() {
        let mut store = store();
        let writes = Rc::new(Cell::new(0));
        let counter = writes.clone();
        let _sub = store.subscribe(move |_| counter.set(counter.get() + 1));

        assert_eq!(store.add_todo(NewTodo::new("")).unwrap(), Outcome::Unchanged);
        assert_eq!(store.add_todo(NewTodo::new("   ")).unwrap(), Outcome::Unchanged);
        assert_eq!(writes.get(), 0);
        assert!(store.storage().get(DEFAULT_KEY).unwrap().is_none());

        store.add_todo(NewTodo::new("keep")).unwrap();
        let id = snapshot(&mut store)[0].id.clone();
        let before = snapshot(&mut store);
        assert_eq!(store.edit_todo(&id, "  ").unwrap(), Outcome::Unchanged);
        assert_eq!(store.toggle_todo("missing").unwrap(), Outcome::Unchanged);
        assert_eq!(store.delete_todo("missing").unwrap(), Outcome::Unchanged);
        assert_eq!(store.delete_subtask(&id, "missing").unwrap(), Outcome::Unchanged);
        assert_eq!(store.add_subtask("missing", "step").unwrap(), Outcome::Unchanged);
        assert_eq!(store.add_subtask(&id, " ").unwrap(), Outcome::Unchanged);
        assert_eq!(store.toggle_subtask(&id, "missing").unwrap(), Outcome::Unchanged);
        assert_eq!(store.reorder_subtasks("missing", &[]).unwrap(), Outcome::Unchanged);
        assert_eq!(snapshot(&mut store), before);
        assert_eq!(writes.get(), 1);
    }

    #[test]
    fn test_edit_replaces_text_only() {
        let (mut store, id) = store_with_subtasks(&["a"]);
        let before = snapshot(&mut store)[0].clone();
        store.edit_todo(&id, "  renamed ").unwrap();
        let after = snapshot(&mut store)[0].clone();
        assert_eq!(after.text, "renamed");
        assert_eq!(Todo { text: before.text.clone(), ..after }, before);
    }

    #[test]
    fn test_delete_todo_removes_one() {
        let mut store = store();
        store.add_todo(NewTodo::new("a")).unwrap();
        store.add_todo(NewTodo::new("b")).unwrap();
        let id = snapshot(&mut store)[0].id.clone();
        store.delete_todo(&id).unwrap();
        let todos = snapshot(&mut store);
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].text, "a");
    }

    #[test]
    fn test_completing_parent_cascades_but_reopening_does_not() {
        let (mut store, id) = store_with_subtasks(&["one", "two"]);
        store.toggle_todo(&id).unwrap();
        let todo = snapshot(&mut store)[0].clone();
        assert!(todo.completed);
        assert!(todo.subtasks.iter().all(|s| s.completed));

        store.toggle_todo(&id).unwrap();
        let todo = snapshot(&mut store)[0].clone();
        assert!(!todo.completed);
        assert!(todo.subtasks.iter().all(|s| s.completed));
    }

    #[test]
    fn test_toggle_subtask_does_not_touch_parent() {
        let (mut store, id) = store_with_subtasks(&["only"]);
        let sub_id = snapshot(&mut store)[0].subtasks[0].id.clone();
        store.toggle_subtask(&id, &sub_id).unwrap();
        let todo = snapshot(&mut store)[0].clone();
        assert!(todo.subtasks[0].completed);
        assert!(!todo.completed);
    }

    #[test]
    fn test_add_subtask_appends_in_order() {
        let (mut store, _) = store_with_subtasks(&["step 1", "step 2"]);
        let todo = snapshot(&mut store)[0].clone();
        assert_eq!(todo.subtasks[0].text, "step 1");
        assert_eq!(todo.subtasks[1].order, 1);
        assert!(!todo.subtasks[1].completed);
    }

    #[test]
    fn test_delete_subtask_renumbers_remaining() {
        let (mut store, id) = store_with_subtasks(&["one", "two", "three"]);
        let first = snapshot(&mut store)[0].subtasks[0].id.clone();
        store.delete_subtask(&id, &first).unwrap();
        let todo = snapshot(&mut store)[0].clone();
        let texts: Vec<(&str, usize)> = todo.subtasks.iter().map(|s| (s.text.as_str(), s.order)).collect();
        assert_eq!(texts, vec![("two", 0), ("three", 1)]);
    }

    #[test]
    fn test_reorder_subtasks() {
        let (mut store, id) = store_with_subtasks(&["A", "B", "C"]);
        let ids: Vec<String> = snapshot(&mut store)[0].subtasks.iter().map(|s| s.id.clone()).collect();
        let order = vec![ids[2].clone(), ids[0].clone(), ids[1].clone()];
        store.reorder_subtasks(&id, &order).unwrap();

        let todo = snapshot(&mut store)[0].clone();
        let texts: Vec<(&str, usize)> = todo.subtasks.iter().map(|s| (s.text.as_str(), s.order)).collect();
        assert_eq!(texts, vec![("C", 0), ("A", 1), ("B", 2)]);
    }

    #[test]
    fn test_reorder_drops_omitted_unknown_and_repeated() {
        let (mut store, id) = store_with_subtasks(&["A", "B", "C"]);
        let ids: Vec<String> = snapshot(&mut store)[0].subtasks.iter().map(|s| s.id.clone()).collect();
        let order = vec![ids[1].clone(), "ghost".to_string(), ids[1].clone(), ids[0].clone()];
        store.reorder_subtasks(&id, &order).unwrap();

        let todo = snapshot(&mut store)[0].clone();
        let texts: Vec<&str> = todo.subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["B", "A"]);
        assert_contiguous(&todo);
    }

    #[test]
    fn test_order_stays_contiguous_across_mixed_operations() {
        let (mut store, id) = store_with_subtasks(&["a", "b", "c", "d"]);
        let ids: Vec<String> = snapshot(&mut store)[0].subtasks.iter().map(|s| s.id.clone()).collect();
        store.delete_subtask(&id, &ids[1]).unwrap();
        assert_contiguous(&snapshot(&mut store)[0]);
        store.add_subtask(&id, "e").unwrap();
        assert_contiguous(&snapshot(&mut store)[0]);

        let current = snapshot(&mut store)[0].clone();
        let reversed: Vec<String> = sorted_subtasks(&current).iter().rev().map(|s| s.id.clone()).collect();
        store.reorder_subtasks(&id, &reversed).unwrap();
        let todo = snapshot(&mut store)[0].clone();
        assert_contiguous(&todo);
        assert_eq!(sorted_subtasks(&todo)[0].text, "e");
        store.delete_subtask(&id, &todo.subtasks[0].id).unwrap();
        assert_contiguous(&snapshot(&mut store)[0]);
    }

    #[test]
    fn test_moved_order_matches_drag_and_drop() {
        let (mut store, _) = store_with_subtasks(&["A", "B", "C"]);
        let subtasks = snapshot(&mut store)[0].subtasks.clone();
        let ids: Vec<String> = subtasks.iter().map(|s| s.id.clone()).collect();

        let moved = moved_order(&subtasks, &ids[0], &ids[2]).unwrap();
        assert_eq!(moved, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        let moved = moved_order(&subtasks, &ids[2], &ids[0]).unwrap();
        assert_eq!(moved, vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]);
        assert!(moved_order(&subtasks, &ids[1], &ids[1]).is_none());
        assert!(moved_order(&subtasks, "ghost", &ids[1]).is_none());
    }

    #[test]
    fn test_pure_ops_leave_input_untouched() {
        let todos = vec![Todo::create(NewTodo::new("x"), 1).unwrap()];
        let original = todos.clone();
        let next = toggle_todo(&todos, &todos[0].id).unwrap();
        assert!(next[0].completed);
        assert_eq!(todos, original);
    }

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Debug-level log output produced while running `f`.
    fn captured_logs(f: impl FnOnce()) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_applied_subtask_changes_are_logged() {
        let (mut store, id) = store_with_subtasks(&["A", "B"]);
        let ids: Vec<String> = snapshot(&mut store)[0].subtasks.iter().map(|s| s.id.clone()).collect();
        let logs = captured_logs(|| {
            store.toggle_subtask(&id, &ids[0]).unwrap();
            store.reorder_subtasks(&id, &[ids[1].clone(), ids[0].clone()]).unwrap();
        });
        assert!(logs.contains("Sub-task toggled"));
        assert!(logs.contains("Sub-tasks reordered"));

        let logs = captured_logs(|| {
            store.toggle_subtask(&id, "missing").unwrap();
            store.reorder_subtasks("missing", &ids).unwrap();
        });
        assert!(!logs.contains("Sub-task toggled"));
        assert!(!logs.contains("Sub-tasks reordered"));
    }

    #[test]
    fn test_add_is_logged_only_once_written() {
        let mut broken = Store::new(MemoryStorage::new().with_value(DEFAULT_KEY, "{not json"), DEFAULT_KEY);
        let logs = captured_logs(|| {
            assert!(broken.add_todo(NewTodo::new("lost")).is_err());
        });
        assert!(!logs.contains("Todo added"));

        let mut store = store();
        let logs = captured_logs(|| {
            store.add_todo(NewTodo::new("kept")).unwrap();
        });
        assert!(logs.contains("Todo added"));
    }
}
