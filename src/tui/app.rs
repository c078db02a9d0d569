//! Main application logic for the terminal user interface.
//!
//! The `App` owns the store for the configured list and subscribes to it.
//! Every successful mutation hands the new collection to the subscription,
//! and the next frame rebuilds the visible rows from that snapshot.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::config::Config;
use crate::error::{AppResult, StoreResult};
use crate::fields::{Category, Priority};
use crate::ops::{moved_order, sorted_subtasks, Outcome};
use crate::storage::KeyValueStorage;
use crate::store::{Store, Subscription};
use crate::task::{NewTodo, Todo};
use crate::tui::{
    colors::{category_color, priority_color, BRAND, DARK_RED},
    enums::{AppState, ListRow},
    input::InputField,
    utils::centered_rect,
};
use crate::util::{format_due_relative, parse_due_input, truncate};
use crate::view::{derive_view, progress, ViewParams};

/// Which input of the add form has focus.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FormField {
    Text,
    Due,
}

/// Main application state for the terminal user interface.
pub struct App<S: KeyValueStorage> {
    state: AppState,
    store: Store<S>,
    latest: Rc<RefCell<Option<Vec<Todo>>>>,
    _subscription: Subscription,
    todos: Vec<Todo>,
    params: ViewParams,
    rows: Vec<ListRow>,
    visible_count: usize,
    expanded: HashSet<String>,
    list_state: TableState,
    input: InputField,
    due_input: InputField,
    form_field: FormField,
    draft_priority: Priority,
    draft_category: Option<Category>,
    editing: Option<String>,
    confirm: Option<ListRow>,
    status_message: String,
}

impl App<crate::storage::FileStorage> {
    /// Open the list named by `config`.
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_store(config.open_store())
    }
}

impl<S: KeyValueStorage> App<S> {
    /// Build the app around an already opened store.
    pub fn with_store(mut store: Store<S>) -> AppResult<Self> {
        let todos = store.read()?.to_vec();
        let latest = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&latest);
        let subscription = store.subscribe(move |todos: &[Todo]| {
            *sink.borrow_mut() = Some(todos.to_vec());
        });

        let mut app = App {
            state: AppState::TodoList,
            store,
            latest,
            _subscription: subscription,
            todos,
            params: ViewParams::default(),
            rows: Vec::new(),
            visible_count: 0,
            expanded: HashSet::new(),
            list_state: TableState::default(),
            input: InputField::new(),
            due_input: InputField::new(),
            form_field: FormField::Text,
            draft_priority: Priority::default(),
            draft_category: None,
            editing: None,
            confirm: None,
            status_message: String::new(),
        };
        app.update_rows();
        Ok(app)
    }

    /// Pick up the snapshot delivered by the store, if any.
    fn sync(&mut self) {
        let delivered = self.latest.borrow_mut().take();
        if let Some(todos) = delivered {
            self.todos = todos;
            self.update_rows();
        }
    }

    /// Re-read the list from storage, picking up changes made elsewhere.
    fn reload(&mut self) {
        match self.store.read() {
            Ok(todos) => {
                self.todos = todos.to_vec();
                self.update_rows();
                self.set_status_message("Reloaded".to_string());
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    /// Recompute the visible rows, keeping the selection on the same item when possible.
    fn update_rows(&mut self) {
        let old_selected = self.selected_row().cloned();

        let visible = derive_view(&self.todos, &self.params);
        self.visible_count = visible.len();
        let mut rows = Vec::with_capacity(visible.len());
        for todo in visible {
            rows.push(ListRow::Todo {
                todo_id: todo.id.clone(),
            });
            if self.expanded.contains(&todo.id) {
                rows.extend(sorted_subtasks(todo).into_iter().map(|s| ListRow::Subtask {
                    todo_id: todo.id.clone(),
                    subtask_id: s.id.clone(),
                }));
            }
        }
        self.rows = rows;

        let restored = old_selected.and_then(|old| {
            self.rows
                .iter()
                .position(|r| *r == old)
                .or_else(|| self.rows.iter().position(|r| r.todo_id() == old.todo_id()))
        });
        let selection = match restored {
            Some(index) => Some(index),
            None if self.rows.is_empty() => None,
            None => Some(
                self.list_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.rows.len() - 1),
            ),
        };
        self.list_state.select(selection);
    }

    fn selected_row(&self) -> Option<&ListRow> {
        self.list_state.selected().and_then(|i| self.rows.get(i))
    }

    fn find_todo(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Report the result of a store mutation in the status bar.
    fn report(&mut self, result: StoreResult<Outcome>, applied: &str) {
        match result {
            Ok(Outcome::Applied) => {
                self.sync();
                self.set_status_message(applied.to_string());
            }
            Ok(Outcome::Unchanged) => {
                // The store re-read storage; another process may have changed it.
                let refreshed = self.store.read().map(<[Todo]>::to_vec);
                if let Ok(todos) = refreshed {
                    self.todos = todos;
                    self.update_rows();
                }
                self.set_status_message("Nothing changed".to_string());
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn select_offset(&mut self, forward: bool) {
        if self.rows.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            None => 0,
            Some(i) if forward => (i + 1).min(self.rows.len() - 1),
            Some(i) => i.saturating_sub(1),
        };
        self.list_state.select(Some(next));
    }

    fn toggle_selected(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        let result = match &row {
            ListRow::Todo { todo_id } => self.store.toggle_todo(todo_id),
            ListRow::Subtask {
                todo_id,
                subtask_id,
            } => self.store.toggle_subtask(todo_id, subtask_id),
        };
        self.report(result, "Toggled");
    }

    fn set_expanded(&mut self, expand: bool) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        let todo_id = row.todo_id().to_string();
        if expand {
            self.expanded.insert(todo_id);
        } else {
            self.expanded.remove(&todo_id);
            if let Some(index) = self.rows.iter().position(|r| {
                matches!(r, ListRow::Todo { todo_id: id } if *id == todo_id)
            }) {
                self.list_state.select(Some(index));
            }
        }
        self.update_rows();
    }

    /// Move the selected sub-task one place up or down among its siblings.
    fn move_selected_subtask(&mut self, up: bool) {
        let Some(ListRow::Subtask {
            todo_id,
            subtask_id,
        }) = self.selected_row().cloned()
        else {
            self.set_status_message("Select a sub-task to move".to_string());
            return;
        };
        let Some(todo) = self.find_todo(&todo_id) else {
            return;
        };
        let siblings = sorted_subtasks(todo);
        let Some(index) = siblings.iter().position(|s| s.id == subtask_id) else {
            return;
        };
        let target = if up {
            index.checked_sub(1)
        } else {
            Some(index + 1)
        };
        let Some(over) = target.and_then(|i| siblings.get(i)) else {
            return;
        };
        let Some(order) = moved_order(&todo.subtasks, &subtask_id, &over.id) else {
            return;
        };
        let result = self.store.reorder_subtasks(&todo_id, &order);
        self.report(result, "Sub-task moved");
    }

    fn start_add(&mut self) {
        self.input.clear();
        self.due_input.clear();
        self.form_field = FormField::Text;
        self.draft_priority = Priority::default();
        self.draft_category = None;
        self.state = AppState::AddTodo;
    }

    fn start_edit(&mut self) {
        let Some(ListRow::Todo { todo_id }) = self.selected_row().cloned() else {
            self.set_status_message("Select a todo to edit".to_string());
            return;
        };
        let Some(text) = self.find_todo(&todo_id).map(|t| t.text.clone()) else {
            return;
        };
        self.input = InputField::with_value(&text);
        self.editing = Some(todo_id);
        self.state = AppState::EditTodo;
    }

    fn start_add_subtask(&mut self) {
        let Some(todo_id) = self.selected_row().map(|r| r.todo_id().to_string()) else {
            return;
        };
        self.expanded.insert(todo_id.clone());
        self.update_rows();
        self.input.clear();
        self.editing = Some(todo_id);
        self.state = AppState::AddSubtask;
    }

    fn submit_add(&mut self) {
        let today = Local::now().date_naive();
        let due_text = self.due_input.value.trim().to_string();
        let due = if due_text.is_empty() {
            None
        } else {
            match parse_due_input(&due_text, today) {
                Some(date) => Some(date),
                None => {
                    self.set_status_message(format!("Invalid due date: '{due_text}'"));
                    return;
                }
            }
        };

        let mut request = NewTodo::new(self.input.value.clone()).priority(self.draft_priority);
        if let Some(date) = due {
            request = request.due(date);
        }
        if let Some(category) = self.draft_category {
            request = request.category(category);
        }
        let result = self.store.add_todo(request);
        let applied = matches!(result, Ok(Outcome::Applied));
        self.report(result, "Todo added");
        if applied {
            self.state = AppState::TodoList;
            // New todos are prepended to the collection.
            let added = self.todos.first().map(|t| t.id.clone());
            if let Some(index) = added.and_then(|id| {
                self.rows
                    .iter()
                    .position(|r| matches!(r, ListRow::Todo { todo_id } if *todo_id == id))
            }) {
                self.list_state.select(Some(index));
            }
        }
    }

    fn submit_edit(&mut self) {
        let Some(todo_id) = self.editing.take() else {
            self.state = AppState::TodoList;
            return;
        };
        let result = self.store.edit_todo(&todo_id, &self.input.value);
        self.state = AppState::TodoList;
        self.report(result, "Todo updated");
    }

    fn submit_subtask(&mut self) {
        let Some(todo_id) = self.editing.clone() else {
            self.state = AppState::TodoList;
            return;
        };
        let text = self.input.take();
        let result = self.store.add_subtask(&todo_id, &text);
        // Stay in the form so several sub-tasks can be entered in a row.
        self.report(result, "Sub-task added");
    }

    fn delete_confirmed(&mut self) {
        let Some(row) = self.confirm.take() else {
            return;
        };
        let result = match &row {
            ListRow::Todo { todo_id } => {
                self.expanded.remove(todo_id);
                self.store.delete_todo(todo_id)
            }
            ListRow::Subtask {
                todo_id,
                subtask_id,
            } => self.store.delete_subtask(todo_id, subtask_id),
        };
        self.report(result, "Deleted");
    }

    /// Description of a row for the confirmation dialog.
    fn describe(&self, row: &ListRow) -> String {
        match row {
            ListRow::Todo { todo_id } => self
                .find_todo(todo_id)
                .map(|t| format!("Delete todo '{}'", t.text))
                .unwrap_or_default(),
            ListRow::Subtask {
                todo_id,
                subtask_id,
            } => self
                .find_todo(todo_id)
                .and_then(|t| t.subtasks.iter().find(|s| s.id == *subtask_id))
                .map(|s| format!("Delete sub-task '{}'", s.text))
                .unwrap_or_default(),
        }
    }

    /// Handle keyboard input when in the todo list view.
    ///
    /// Returns true if the application should quit.
    fn handle_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.params.search.is_empty() {
                    return true;
                }
                self.params.search.clear();
                self.update_rows();
                self.set_status_message("Search cleared".to_string());
            }
            KeyCode::Up | KeyCode::Char('k') => self.select_offset(false),
            KeyCode::Down | KeyCode::Char('j') => self.select_offset(true),
            KeyCode::Char('K') => self.move_selected_subtask(true),
            KeyCode::Char('J') => self.move_selected_subtask(false),
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
            KeyCode::Enter => {
                let expanded = self
                    .selected_row()
                    .is_some_and(|r| self.expanded.contains(r.todo_id()));
                self.set_expanded(!expanded);
            }
            KeyCode::Right | KeyCode::Char('l') => self.set_expanded(true),
            KeyCode::Left => self.set_expanded(false),
            KeyCode::Char('a') => self.start_add(),
            KeyCode::Char('e') => self.start_edit(),
            KeyCode::Char('s') => self.start_add_subtask(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(row) = self.selected_row().cloned() {
                    self.confirm = Some(row);
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('f') => {
                self.params.status = self.params.status.cycle();
                self.update_rows();
                self.set_status_message(format!("Status: {}", self.params.status.label()));
            }
            KeyCode::Char('c') => {
                self.params.category = self.params.category.cycle();
                self.update_rows();
                self.set_status_message(format!("Category: {}", self.params.category.label()));
            }
            KeyCode::Char('o') => {
                self.params.sort = self.params.sort.cycle();
                self.update_rows();
                self.set_status_message(format!("Sort: {}", self.params.sort.label()));
            }
            KeyCode::Char('/') => {
                self.input = InputField::with_value(&self.params.search);
                self.state = AppState::Search;
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    /// Editing keys shared by every text input.
    fn edit_field(field: &mut InputField, key: KeyCode) {
        match key {
            KeyCode::Char(c) => field.handle_char(c),
            KeyCode::Backspace => field.handle_backspace(),
            KeyCode::Delete => field.handle_delete(),
            KeyCode::Left => field.move_cursor_left(),
            KeyCode::Right => field.move_cursor_right(),
            KeyCode::Home => field.move_home(),
            KeyCode::End => field.move_end(),
            _ => {}
        }
    }

    fn handle_add_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::TodoList,
            KeyCode::Enter => self.submit_add(),
            KeyCode::Tab => self.draft_priority = self.draft_priority.cycle(),
            KeyCode::BackTab => self.draft_category = Category::cycle(self.draft_category),
            KeyCode::Up | KeyCode::Down => {
                self.form_field = match self.form_field {
                    FormField::Text => FormField::Due,
                    FormField::Due => FormField::Text,
                };
            }
            _ => match self.form_field {
                FormField::Text => Self::edit_field(&mut self.input, key),
                FormField::Due => Self::edit_field(&mut self.due_input, key),
            },
        }
    }

    fn handle_edit_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.editing = None;
                self.state = AppState::TodoList;
            }
            KeyCode::Enter => self.submit_edit(),
            _ => Self::edit_field(&mut self.input, key),
        }
    }

    fn handle_subtask_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.editing = None;
                self.state = AppState::TodoList;
            }
            KeyCode::Enter => self.submit_subtask(),
            _ => Self::edit_field(&mut self.input, key),
        }
    }

    /// The search text is applied as it is typed.
    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.params.search.clear();
                self.state = AppState::TodoList;
            }
            KeyCode::Enter => {
                self.state = AppState::TodoList;
                if !self.params.search.is_empty() {
                    self.set_status_message(format!(
                        "Search: '{}' ({} todos)",
                        self.params.search, self.visible_count
                    ));
                }
                return;
            }
            _ => {
                Self::edit_field(&mut self.input, key);
                self.params.search = self.input.value.clone();
            }
        }
        self.update_rows();
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.state = AppState::TodoList;
                self.delete_confirmed();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::TodoList;
                self.confirm = None;
            }
            _ => {}
        }
    }

    /// Dispatch one key press by application state.
    ///
    /// Returns true if the application should quit.
    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if !self.state.takes_text() {
            self.status_message.clear();
        }
        match self.state {
            AppState::TodoList => return self.handle_list_input(key, modifiers),
            AppState::AddTodo => self.handle_add_input(key),
            AppState::EditTodo => self.handle_edit_input(key),
            AppState::AddSubtask => self.handle_subtask_input(key),
            AppState::Search => self.handle_search_input(key),
            AppState::Help => self.state = AppState::TodoList,
            AppState::Confirm => self.handle_confirm_input(key),
        }
        false
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> AppResult<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("TODO", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "Status: {}  Category: {}  Sort: {}",
                    self.params.status.label(),
                    self.params.category.label(),
                    self.params.sort.label()
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ];
        if !self.params.search.is_empty() {
            spans.push(Span::styled(
                format!("  Search: '{}'", self.params.search),
                Style::default().fg(Color::Yellow),
            ));
        }
        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn todo_row(todo: &Todo, expanded: bool, today: chrono::NaiveDate) -> Row<'static> {
        let marker = match (todo.subtasks.is_empty(), expanded) {
            (true, _) => " ",
            (false, true) => "▾",
            (false, false) => "▸",
        };
        let check = if todo.completed { "[x]" } else { "[ ]" };
        let steps = progress(todo).map_or_else(String::new, |p| p.to_string());
        let category = match todo.category {
            Some(c) => Cell::from(c.label()).style(Style::default().fg(category_color(c))),
            None => Cell::from("-"),
        };
        let style = if todo.completed {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(Color::White)
        };

        Row::new(vec![
            Cell::from(marker),
            Cell::from(check),
            Cell::from(todo.priority.label())
                .style(Style::default().fg(priority_color(todo.priority))),
            category,
            Cell::from(truncate(&todo.text, 80)),
            Cell::from(steps),
            Cell::from(format_due_relative(todo.due_date, today)),
        ])
        .style(style)
    }

    /// Render the main todo list, or the placeholder when nothing is visible.
    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.render_header(f, chunks[0]);

        let title = format!(
            "Todos ({}/{}) - Press 'h' for help",
            self.visible_count,
            self.todos.len()
        );
        if self.rows.is_empty() {
            let placeholder = Paragraph::new(vec![Line::from(""), Line::from("No todos")])
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(placeholder, chunks[1]);
            return;
        }

        let today = Local::now().date_naive();
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let Some(todo) = self.find_todo(row.todo_id()) else {
                continue;
            };
            match row {
                ListRow::Todo { .. } => {
                    rows.push(Self::todo_row(todo, self.expanded.contains(&todo.id), today));
                }
                ListRow::Subtask { subtask_id, .. } => {
                    let siblings = sorted_subtasks(todo);
                    let Some(position) = siblings.iter().position(|s| s.id == *subtask_id) else {
                        continue;
                    };
                    let subtask = siblings[position];
                    let style = if subtask.completed {
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    let check = if subtask.completed { "[x]" } else { "[ ]" };
                    rows.push(
                        Row::new(vec![
                            Cell::from(""),
                            Cell::from(""),
                            Cell::from(""),
                            Cell::from(""),
                            Cell::from(format!(
                                "  {check} {}. {}",
                                position + 1,
                                truncate(&subtask.text, 74)
                            )),
                            Cell::from(""),
                            Cell::from(""),
                        ])
                        .style(style),
                    );
                }
            }
        }

        let header = Row::new(
            ["", "Done", "Pri", "Cat", "Text", "Steps", "Due"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(BRAND).fg(Color::White))
        .height(1);

        let widths = [
            Constraint::Length(1),  // Expand marker
            Constraint::Length(4),  // Done
            Constraint::Length(6),  // Priority
            Constraint::Length(4),  // Category
            Constraint::Min(25),    // Text
            Constraint::Length(5),  // Steps
            Constraint::Length(10), // Due
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.list_state);
    }

    /// Render the popup used for adding, editing and searching.
    fn render_form(&mut self, f: &mut Frame, area: Rect) {
        let title = match self.state {
            AppState::AddTodo => "Add Todo".to_string(),
            AppState::EditTodo => "Edit Todo".to_string(),
            AppState::Search => "Search".to_string(),
            _ => {
                let parent = self
                    .editing
                    .as_deref()
                    .and_then(|id| self.find_todo(id))
                    .map(|t| truncate(&t.text, 30))
                    .unwrap_or_default();
                format!("Add Sub-task to '{parent}'")
            }
        };
        let height = if self.state == AppState::AddTodo { 9 } else { 5 };
        let popup = centered_rect(60, 40, area);
        let popup = Rect {
            height: popup.height.min(height),
            ..popup
        };
        f.render_widget(Clear, popup);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::White).bg(Color::Blue));
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let focused = Style::default().fg(Color::Yellow);
        let mut lines = vec![Line::from(Span::styled(self.input.value.clone(), focused))];
        if self.state == AppState::AddTodo {
            let (text_style, due_style) = match self.form_field {
                FormField::Text => (focused, Style::default()),
                FormField::Due => (Style::default(), focused),
            };
            lines[0] = Line::from(Span::styled(self.input.value.clone(), text_style));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::raw("Due: "),
                Span::styled(self.due_input.value.clone(), due_style),
            ]));
            let category = self.draft_category.map_or("-", |c| c.label());
            lines.push(Line::from(format!(
                "Priority: {} (Tab)   Category: {} (Shift+Tab)",
                self.draft_priority.label(),
                category
            )));
            lines.push(Line::from(""));
            lines.push(Line::from("Up/Down switch field  Enter save  Esc cancel"));
        } else {
            lines.push(Line::from(""));
            lines.push(Line::from("Enter confirm  Esc cancel"));
        }
        f.render_widget(Paragraph::new(lines), inner);

        let (x, y) = match (self.state, self.form_field) {
            (AppState::AddTodo, FormField::Due) => (5 + self.due_input.cursor_column(), 2),
            _ => (self.input.cursor_column(), 0),
        };
        f.set_cursor_position((inner.x + x.min(inner.width.saturating_sub(1)), inner.y + y));
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Todo Help", bold)),
            Line::from(""),
            Line::from(Span::styled("List:", bold)),
            Line::from("  Up/k, Down/j   Move selection"),
            Line::from("  Space/x        Toggle completion (completing a todo completes its sub-tasks)"),
            Line::from("  Enter          Expand or collapse sub-tasks"),
            Line::from("  Right/l, Left  Expand, collapse"),
            Line::from("  a              Add todo"),
            Line::from("  e              Edit todo text"),
            Line::from("  s              Add sub-tasks to the selected todo"),
            Line::from("  K / J          Move sub-task up / down"),
            Line::from("  d/Delete       Delete todo or sub-task"),
            Line::from("  f              Cycle status filter (All, Active, Completed)"),
            Line::from("  c              Cycle category filter"),
            Line::from("  o              Cycle sort (Newest, Text, Due date)"),
            Line::from("  /              Search todo text"),
            Line::from("  r              Reload from disk"),
            Line::from("  h/?            Show this help"),
            Line::from("  q/Esc/Ctrl+C   Quit (Esc clears an active search first)"),
            Line::from(""),
            Line::from(Span::styled("Add form:", bold)),
            Line::from("  Tab            Cycle priority"),
            Line::from("  Shift+Tab      Cycle category"),
            Line::from("  Up/Down        Switch between text and due date"),
            Line::from(""),
            Line::from(Span::styled("Due Date Formats:", bold)),
            Line::from("  YYYY-MM-DD, today, tomorrow, friday, next mon, in 3d, in 2w, eow, eom"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for deletions.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let description = self
            .confirm
            .as_ref()
            .map(|row| self.describe(row))
            .unwrap_or_default();
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                description,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TodoList => format!(
                    "Todos: {} | {} | Press 'h' for help",
                    self.visible_count,
                    self.store.key()
                ),
                AppState::AddTodo => "Add Todo".to_string(),
                AppState::EditTodo => "Edit Todo".to_string(),
                AppState::AddSubtask => "Add Sub-task (Esc when done)".to_string(),
                AppState::Search => format!("Search: {} (Esc to clear, Enter to confirm)", self.input.value),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(BRAND).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TodoList => self.render_list(f, chunks[0]),
            AppState::AddTodo | AppState::EditTodo | AppState::AddSubtask | AppState::Search => {
                self.render_list(f, chunks[0]);
                self.render_form(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        loop {
            self.sync();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
