use rocket::response::status::{Created, NoContent};
use rocket::serde::json::{self, Json, Value};
use rocket::{Route, State};

use crate::error::ApiError;
use crate::models::{Todo, TodoId, TodoInput, Validation};
use crate::pagination::Page;
use crate::service::{TodoService, COLLECTION_PATH};

/// Binds a request body to a [`TodoInput`]. Only JSON objects are accepted.
fn todo_input(body: Result<Json<Value>, json::Error<'_>>) -> Result<TodoInput, ApiError> {
    let value = body?.into_inner();
    if !value.is_object() {
        return Err(ApiError::MalformedBody("expected a JSON object".to_owned()));
    }
    json::from_value(value).map_err(|err| ApiError::MalformedBody(err.to_string()))
}

#[get("/todos?<page>")]
async fn list_todos(
    service: &State<TodoService>,
    page: Option<&str>,
) -> Result<Json<Page<Todo>>, ApiError> {
    Ok(Json(service.list(page).await?))
}

#[get("/todos/<id>")]
async fn get_todo(service: &State<TodoService>, id: TodoId) -> Result<Json<Todo>, ApiError> {
    Ok(Json(service.get(id).await?))
}

#[post("/todos", data = "<todo>")]
async fn create_todo(
    service: &State<TodoService>,
    todo: Result<Json<Value>, json::Error<'_>>,
) -> Result<Created<Json<Todo>>, ApiError> {
    let todo = service.create(todo_input(todo)?).await?;
    let location = format!("{COLLECTION_PATH}{}/", todo.id);
    Ok(Created::new(location).body(Json(todo)))
}

#[put("/todos/<id>", data = "<todo>")]
async fn update_todo(
    service: &State<TodoService>,
    id: TodoId,
    todo: Result<Json<Value>, json::Error<'_>>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(service.update(id, todo_input(todo)?, Validation::Full).await?))
}

#[patch("/todos/<id>", data = "<todo>")]
async fn patch_todo(
    service: &State<TodoService>,
    id: TodoId,
    todo: Result<Json<Value>, json::Error<'_>>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(service.update(id, todo_input(todo)?, Validation::Partial).await?))
}

#[delete("/todos/<id>")]
async fn delete_todo(service: &State<TodoService>, id: TodoId) -> Result<NoContent, ApiError> {
    service.delete(id).await?;
    Ok(NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![list_todos, get_todo, create_todo, update_todo, patch_todo, delete_todo]
}
