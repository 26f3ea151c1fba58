use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::{json, Json, Value};
use rocket::{Catcher, Request};
use thiserror::Error;

use crate::service::TodoError;

/// Every way a request can fail, as the client sees it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Todo(#[from] TodoError),

    /// The body was not JSON, or held a value of the wrong type.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl<'a> From<rocket::serde::json::Error<'a>> for ApiError {
    fn from(err: rocket::serde::json::Error<'a>) -> Self {
        Self::MalformedBody(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::MalformedBody(_) => Status::BadRequest,
            Self::Todo(TodoError::Validation(_)) => Status::BadRequest,
            Self::Todo(TodoError::NotFound(_) | TodoError::InvalidPage(_)) => Status::NotFound,
            Self::Todo(TodoError::Store(_)) => Status::InternalServerError,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::MalformedBody(message) => {
                json!({ "detail": format!("JSON parse error - {message}") })
            }
            Self::Todo(TodoError::Validation(errors)) => json!(errors),
            Self::Todo(TodoError::NotFound(_)) => no_todo_body(),
            Self::Todo(TodoError::InvalidPage(err)) => json!({ "detail": err.to_string() }),
            Self::Todo(TodoError::Store(_)) => server_error_body(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            log::error!("{} {}: {self}", req.method(), req.uri());
        } else {
            log::debug!("{} {}: {self}", req.method(), req.uri());
        }
        (status, Json(self.body())).respond_to(req)
    }
}

fn no_todo_body() -> Value {
    json!({ "detail": "No Todo matches the given query." })
}

fn server_error_body() -> Value {
    json!({ "detail": "A server error occurred." })
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({ "detail": "Not found." }))
}

/// Rocket forwards with 422 when a path parameter fails to parse. Here that
/// can only be a todo id that is not an `i32`, which names no todo.
#[catch(422)]
fn unparsable_path() -> (Status, Json<Value>) {
    (Status::NotFound, Json(no_todo_body()))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(server_error_body())
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request<'_>) -> (Status, Json<Value>) {
    (status, Json(json!({ "detail": status.reason_lossy() })))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![not_found, unparsable_path, server_error, default_catcher]
}
