//! Persistence port for todos, with in-memory and PostgreSQL adapters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{NewTodo, Todo, TodoId};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgPool, PostgresStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Todo persistence contract.
///
/// Listing returns records newest first: `created_at` descending, then
/// `id` descending.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Persists a new record and returns it with its assigned id.
    async fn insert(&self, todo: NewTodo) -> StoreResult<Todo>;

    async fn find(&self, id: TodoId) -> StoreResult<Option<Todo>>;

    async fn count(&self) -> StoreResult<u64>;

    async fn list(&self, offset: u64, limit: u64) -> StoreResult<Vec<Todo>>;

    /// Overwrites the mutable columns of an existing record, provided its
    /// stored `updated_at` is still `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record has `todo.id`, and
    /// [`StoreError::Conflict`] when the record was modified since it was
    /// read.
    async fn update(&self, todo: &Todo, expected: DateTime<Utc>) -> StoreResult<Todo>;

    /// Hard-deletes a record. Returns `false` when nothing was deleted.
    async fn delete(&self, id: TodoId) -> StoreResult<bool>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    #[error("todo {0} was modified concurrently")]
    Conflict(TodoId),

    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
