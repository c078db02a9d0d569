//! The canonical todo collection.
//!
//! `Store` is the single source of truth for one storage key. It reads the
//! persisted value on every `read`, but only re-parses it when the raw text
//! differs from what it saw last time. Every `write` replaces the whole
//! collection, refreshes the cache and synchronously notifies subscribers.
//!
//! Everything here is single-threaded: listeners live behind `Rc<RefCell<..>>`
//! and run to completion before `write` returns.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::error::{StoreError, StoreResult};
use crate::storage::KeyValueStorage;
use crate::task::Todo;

/// Storage key used when none is configured.
pub const DEFAULT_KEY: &str = "todos";

type Listener = Rc<dyn Fn(&[Todo])>;
type Listeners = RefCell<BTreeMap<u64, Listener>>;

/// Handle returned by [`Store::subscribe`].
#[must_use = "keep the Subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Deregister the callback. Other subscribers are unaffected.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().remove(&self.id);
        }
    }
}

/// In-memory view of the todo list persisted under one key.
pub struct Store<S> {
    storage: S,
    key: String,
    /// Raw value the cache was parsed from. Outer `None` means never read.
    cached_raw: Option<Option<String>>,
    cached: Vec<Todo>,
    listeners: Rc<Listeners>,
    next_listener: u64,
}

impl<S: KeyValueStorage> Store<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            cached_raw: None,
            cached: Vec::new(),
            listeners: Rc::new(RefCell::new(BTreeMap::new())),
            next_listener: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Direct access to the backend. Writes made here bypass subscribers
    /// and are picked up by the next `read`.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Release the backend, e.g. to build a fresh store over the same data.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Current collection. Nothing stored yet reads as an empty list.
    ///
    /// Fails fast with [`StoreError::Corrupt`] if the stored text is not a
    /// todo list; the stored value is left untouched.
    pub fn read(&mut self) -> StoreResult<&[Todo]> {
        let raw = self.storage.get(&self.key)?;
        if self.cached_raw.as_ref() != Some(&raw) {
            let todos = match raw.as_deref() {
                Some(text) if !text.is_empty() => {
                    serde_json::from_str(text).map_err(|source| StoreError::Corrupt {
                        key: self.key.clone(),
                        source,
                    })?
                }
                _ => Vec::new(),
            };
            tracing::trace!(key = %self.key, count = todos.len(), "Todo cache refreshed");
            self.cached = todos;
            self.cached_raw = Some(raw);
        }
        Ok(&self.cached)
    }

    /// Persist `todos` as the whole collection and notify subscribers.
    pub fn write(&mut self, todos: Vec<Todo>) -> StoreResult<()> {
        let raw = serde_json::to_string(&todos).map_err(StoreError::Serialise)?;
        self.storage.set(&self.key, &raw)?;
        tracing::debug!(key = %self.key, count = todos.len(), "Todos written");
        self.cached = todos;
        self.cached_raw = Some(Some(raw));
        self.notify();
        Ok(())
    }

    /// Register `callback` to run after every write with the new collection.
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: Fn(&[Todo]) + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.borrow_mut().insert(id, Rc::new(callback));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self) {
        // Snapshot first so callbacks may (un)subscribe while we iterate.
        let listeners: Vec<Listener> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(&self.cached);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::task::NewTodo;

    fn todo(text: &str) -> Todo {
        Todo::create(NewTodo::new(text), 0).unwrap()
    }

    #[test]
    fn test_empty_storage_reads_empty() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        assert!(store.read().unwrap().is_empty());
        let mut store = Store::new(MemoryStorage::new().with_value(DEFAULT_KEY, ""), DEFAULT_KEY);
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_read_is_idempotent_and_round_trips() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        let todos = vec![todo("a"), todo("b")];
        store.write(todos.clone()).unwrap();
        let first = store.read().unwrap().to_vec();
        let second = store.read().unwrap().to_vec();
        assert_eq!(first, todos);
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_store_over_existing_storage() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        store.write(vec![todo("mine")]).unwrap();
        let written = store.read().unwrap().to_vec();

        let mut reopened = Store::new(store.into_storage(), DEFAULT_KEY);
        assert_eq!(reopened.read().unwrap(), written.as_slice());
    }

    #[test]
    fn test_unchanged_raw_is_not_reparsed() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        store.write(vec![todo("mine")]).unwrap();

        // Only a re-parse would throw this marker away.
        store.cached[0].text = "cached".to_string();
        assert_eq!(store.read().unwrap()[0].text, "cached");
        assert_eq!(store.read().unwrap()[0].text, "cached");
    }

    #[test]
    fn test_cache_follows_outside_writes() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        store.write(vec![todo("mine")]).unwrap();
        store.cached[0].text = "cached".to_string();

        let mut other = vec![todo("theirs"), todo("also theirs")];
        other[0].completed = true;
        let raw = serde_json::to_string(&other).unwrap();
        store.storage_mut().set(DEFAULT_KEY, &raw).unwrap();
        assert_eq!(store.read().unwrap(), other.as_slice());

        store.storage_mut().set(DEFAULT_KEY, "[]").unwrap();
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_value_fails_fast() {
        let storage = MemoryStorage::new().with_value(DEFAULT_KEY, "{not json");
        let mut store = Store::new(storage, DEFAULT_KEY);
        assert!(matches!(store.read(), Err(StoreError::Corrupt { .. })));
        assert_eq!(
            store.storage().get(DEFAULT_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_subscribers_are_notified_and_independent() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0usize));

        let seen = first.clone();
        let sub_a = store.subscribe(move |_| seen.set(seen.get() + 1));
        let seen = second.clone();
        let _sub_b = store.subscribe(move |todos| seen.set(todos.len()));

        store.write(vec![todo("x")]).unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);

        sub_a.unsubscribe();
        assert_eq!(store.subscriber_count(), 1);
        store.write(vec![todo("x"), todo("y")]).unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
    }

    #[test]
    fn test_unsubscribe_after_store_dropped_is_harmless() {
        let mut store = Store::new(MemoryStorage::new(), DEFAULT_KEY);
        let sub = store.subscribe(|_| {});
        drop(store);
        sub.unsubscribe();
    }
}
