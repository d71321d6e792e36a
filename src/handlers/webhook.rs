//! Webhook intake handlers.
//!
//! The live endpoint authenticates the raw body against the channel secret
//! before anything is parsed. An empty secret disables validation for local
//! development; the test endpoints never validate.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::event::Event;
use crate::response;
use crate::server::AppState;

const SIGNATURE_HEADER: &str = "x-chatbridge-signature";

#[derive(Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    events: Vec<Event>,
}

/// Check the base64 HMAC-SHA256 signature of the raw body. An empty secret
/// means validation is disabled.
fn signature_valid(secret: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    if secret.is_empty() {
        return true;
    }
    let Some(provided) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = BASE64.encode(mac.finalize().into_bytes());
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

async fn process(state: &AppState, body: &[u8]) -> Response {
    let payload: WebhookPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("malformed webhook payload: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response();
        }
    };

    // Platform verification probes send an empty batch.
    if payload.events.is_empty() {
        info!("webhook verification request");
        return Json(json!({
            "success": true,
            "message": "Webhook verification successful",
        }))
        .into_response();
    }

    let count = payload.events.len();
    let results = state.dispatcher.handle_events(payload.events).await;
    info!("processed {count} webhook event(s)");
    Json(json!({ "success": true, "processed": results.len() })).into_response()
}

/// POST /webhook
pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !signature_valid(&state.channel_secret, &headers, &body) {
        warn!("webhook signature validation failed");
        return response::unauthorized("Invalid signature").into_response();
    }
    process(&state, &body).await
}

/// POST /webhook/test-verify
///
/// Same pipeline without signature validation, for probing from tools that
/// cannot sign the body.
pub async fn test_verify(State(state): State<AppState>, body: Bytes) -> Response {
    process(&state, &body).await
}

/// POST /webhook/test
///
/// Runs a canned text event through the dispatcher. The sentinel reply token
/// keeps the dispatcher from calling out to the platform.
pub async fn test_event(State(state): State<AppState>) -> Response {
    let event: Event = match serde_json::from_value(json!({
        "type": "message",
        "replyToken": "test-token-123",
        "source": { "type": "user", "userId": "test-user-123" },
        "message": { "type": "text", "id": "test-message-1", "text": "Test message from server" }
    })) {
        Ok(event) => event,
        Err(e) => return response::internal_error(e.to_string()).into_response(),
    };

    let result = state.dispatcher.handle_event(event).await;
    Json(json!({ "success": true, "result": result })).into_response()
}
