use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Value, json};

use crate::server::AppState;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

pub async fn readyz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// GET /health
///
/// Status document with pointers to the service's surfaces.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "api": "/api/v1",
            "webhook": "/webhook",
        },
        "ocrConfigured": state.ocr_configured,
        "exportConfigured": state.export_configured,
    }))
}
