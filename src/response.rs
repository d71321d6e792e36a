//! Shared HTTP error responses.
//!
//! Every error body has the shape `{"error": {"message": "..."}}`.

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "error": { "message": message.into() } }))
}

pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, error_body(message))
}

pub fn unauthorized(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, error_body(message))
}

pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, error_body(message))
}

pub fn internal_error(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, error_body(message))
}
