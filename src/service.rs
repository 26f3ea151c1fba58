use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use mockable::Clock;
use thiserror::Error;

use crate::models::{NewTodo, Todo, TodoId, TodoInput, Validation, ValidationErrors};
use crate::pagination::{InvalidPage, Page, PageWindow};
use crate::store::{StoreError, TodoStore};

pub const COLLECTION_PATH: &str = "/todos/";

/// Conditional writes attempted before a contended update gives up.
const UPDATE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("todo not found: {0}")]
    NotFound(TodoId),

    #[error(transparent)]
    InvalidPage(#[from] InvalidPage),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TodoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type TodoResult<T> = Result<T, TodoError>;

/// Todo operations on top of a [`TodoStore`]: validation, defaults and
/// timestamps live here, persistence lives in the store.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock + Send + Sync>,
    page_size: u64,
}

impl TodoService {
    pub fn new(
        store: Arc<dyn TodoStore>,
        clock: Arc<dyn Clock + Send + Sync>,
        page_size: u64,
    ) -> Self {
        Self { store, clock, page_size }
    }

    /// Current time at the resolution PostgreSQL stores.
    fn now(&self) -> DateTime<Utc> {
        self.clock.utc().trunc_subsecs(6)
    }

    /// A modification time strictly after `previous`, even when the clock
    /// has not moved (or moved backwards).
    fn next_update_after(&self, previous: DateTime<Utc>) -> DateTime<Utc> {
        let now = self.now();
        if now > previous {
            now
        } else {
            previous + Duration::microseconds(1)
        }
    }

    pub async fn list(&self, page: Option<&str>) -> TodoResult<Page<Todo>> {
        let count = self.store.count().await?;
        let window = PageWindow::resolve(page, self.page_size, count)?;
        let results = self.store.list(window.offset(), window.limit()).await?;
        Ok(Page::new(results, window, COLLECTION_PATH))
    }

    pub async fn get(&self, id: TodoId) -> TodoResult<Todo> {
        self.store.find(id).await?.ok_or(TodoError::NotFound(id))
    }

    pub async fn create(&self, input: TodoInput) -> TodoResult<Todo> {
        let changes = input.validate(Validation::Full)?;
        let todo = self.store.insert(NewTodo::from_changes(changes, self.now())).await?;
        log::info!("created todo {}", todo.id);
        Ok(todo)
    }

    /// Full (`Validation::Full`) or partial (`Validation::Partial`) update.
    ///
    /// The write only lands if the record is unchanged since it was read;
    /// otherwise the changes are reapplied to a fresh read.
    pub async fn update(&self, id: TodoId, input: TodoInput, mode: Validation) -> TodoResult<Todo> {
        let mut current = self.get(id).await?;
        let changes = input.validate(mode)?;

        for _ in 0..UPDATE_ATTEMPTS {
            let read_at = current.updated_at;
            let mut todo = current;
            todo.apply(changes.clone(), self.next_update_after(read_at));
            match self.store.update(&todo, read_at).await {
                Ok(todo) => {
                    log::info!("updated todo {}", todo.id);
                    return Ok(todo);
                }
                Err(StoreError::Conflict(_)) => {
                    log::debug!("todo {id} changed while updating, retrying");
                    current = self.get(id).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        log::warn!("giving up on todo {id} after {UPDATE_ATTEMPTS} conflicting writes");
        Err(StoreError::Conflict(id).into())
    }

    pub async fn delete(&self, id: TodoId) -> TodoResult<()> {
        if !self.store.delete(id).await? {
            return Err(TodoError::NotFound(id));
        }
        log::info!("deleted todo {id}");
        Ok(())
    }
}
