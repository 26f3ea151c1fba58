use rocket::serde::json::{json, Json, Value};
use rocket::Route;

/// Liveness probe. Never touches the store.
#[get("/health")]
fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn routes() -> Vec<Route> {
    routes![health]
}
