use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use rocket::tokio::task::spawn_blocking;

use super::{StoreError, StoreResult, TodoStore};
use crate::models::{NewTodo, Todo, TodoId};
use crate::schema::todos;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// PostgreSQL-backed store. Queries run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `database_url` and checks that a connection can be
    /// established.
    pub async fn connect(database_url: &str, pool_size: u32) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = spawn_blocking(move || Pool::builder().max_size(pool_size).build(manager))
            .await
            .map_err(StoreError::persistence)?
            .map_err(StoreError::persistence)?;
        Ok(Self::new(pool))
    }

    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::persistence)?;
            f(&mut connection).map_err(StoreError::persistence)
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl TodoStore for PostgresStore {
    async fn insert(&self, todo: NewTodo) -> StoreResult<Todo> {
        self.run(move |c| {
            diesel::insert_into(todos::table)
                .values(&todo)
                .returning(Todo::as_returning())
                .get_result(c)
        })
        .await
    }

    async fn find(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        self.run(move |c| todos::table.find(id).select(Todo::as_select()).first(c).optional())
            .await
    }

    async fn count(&self) -> StoreResult<u64> {
        let count: i64 = self.run(|c| todos::table.count().get_result(c)).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list(&self, offset: u64, limit: u64) -> StoreResult<Vec<Todo>> {
        self.run(move |c| {
            todos::table
                .order((todos::created_at.desc(), todos::id.desc()))
                .offset(to_i64(offset))
                .limit(to_i64(limit))
                .select(Todo::as_select())
                .load(c)
        })
        .await
    }

    async fn update(&self, todo: &Todo, expected: DateTime<Utc>) -> StoreResult<Todo> {
        let id = todo.id;
        let todo = todo.clone();
        self.run(move |c| {
            let updated = diesel::update(
                todos::table.find(todo.id).filter(todos::updated_at.eq(expected)),
            )
            .set((
                todos::title.eq(&todo.title),
                todos::description.eq(&todo.description),
                todos::completed.eq(todo.completed),
                todos::updated_at.eq(todo.updated_at),
            ))
            .returning(Todo::as_returning())
            .get_result(c)
            .optional()?;
            if let Some(updated) = updated {
                return Ok(Ok(updated));
            }
            let present: bool = diesel::select(exists(todos::table.find(id))).get_result(c)?;
            Ok(Err(if present { StoreError::Conflict(id) } else { StoreError::NotFound(id) }))
        })
        .await?
    }

    async fn delete(&self, id: TodoId) -> StoreResult<bool> {
        let deleted = self.run(move |c| diesel::delete(todos::table.find(id)).execute(c)).await?;
        Ok(deleted == 1)
    }
}
