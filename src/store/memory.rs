use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{StoreError, StoreResult, TodoStore};
use crate::models::{NewTodo, Todo, TodoId};

/// Thread-safe in-memory store, used by the debug profile and the tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: TodoId,
    todos: HashMap<TodoId, Todo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> StoreResult<T> {
        let state = self.state.read().map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.state.write().map_err(|err| StoreError::Unavailable(err.to_string()))?;
        f(&mut state)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert(&self, todo: NewTodo) -> StoreResult<Todo> {
        self.write(|state| {
            state.last_id = state
                .last_id
                .checked_add(1)
                .ok_or_else(|| StoreError::Unavailable("todo id space exhausted".to_owned()))?;
            let todo = Todo {
                id: state.last_id,
                title: todo.title,
                description: todo.description,
                completed: todo.completed,
                created_at: todo.created_at,
                updated_at: todo.updated_at,
            };
            state.todos.insert(todo.id, todo.clone());
            Ok(todo)
        })
    }

    async fn find(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        self.read(|state| state.todos.get(&id).cloned())
    }

    async fn count(&self) -> StoreResult<u64> {
        self.read(|state| state.todos.len() as u64)
    }

    async fn list(&self, offset: u64, limit: u64) -> StoreResult<Vec<Todo>> {
        self.read(|state| {
            let mut todos: Vec<&Todo> = state.todos.values().collect();
            todos.sort_by_key(|todo| Reverse((todo.created_at, todo.id)));
            todos
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .cloned()
                .collect()
        })
    }

    async fn update(&self, todo: &Todo, expected: DateTime<Utc>) -> StoreResult<Todo> {
        self.write(|state| {
            let stored = state.todos.get_mut(&todo.id).ok_or(StoreError::NotFound(todo.id))?;
            if stored.updated_at != expected {
                return Err(StoreError::Conflict(todo.id));
            }
            stored.title.clone_from(&todo.title);
            stored.description.clone_from(&todo.description);
            stored.completed = todo.completed;
            stored.updated_at = todo.updated_at;
            Ok(stored.clone())
        })
    }

    async fn delete(&self, id: TodoId) -> StoreResult<bool> {
        self.write(|state| Ok(state.todos.remove(&id).is_some()))
    }
}
