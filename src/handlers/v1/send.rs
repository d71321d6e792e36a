//! Outbound messaging HTTP handlers.
//!
//! Thin adapters from request bodies to gateway calls; every handler answers
//! 200 with a `DeliveryResult` body, success flag included.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::DeliveryResult;
use crate::response;
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTextRequest {
    to: String,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaRequest {
    to: String,
    original_content_url: String,
    preview_image_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAudioRequest {
    to: String,
    original_content_url: String,
    duration: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLocationRequest {
    to: String,
    title: String,
    address: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendStickerRequest {
    to: String,
    package_id: String,
    sticker_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCardRequest {
    to: String,
    alt_text: String,
    /// Either a card object or a JSON string containing one.
    contents: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticastRequest {
    to: Vec<String>,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    reply_token: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    messages: Option<Vec<String>>,
}

/// POST /api/v1/send/text
///
/// Sends the text wrapped in the saved-confirmation card rather than as a
/// bare text message, so pushed and edited messages look alike in the chat.
pub async fn send_text(
    State(state): State<AppState>,
    Json(req): Json<SendTextRequest>,
) -> Json<DeliveryResult> {
    let card = state.cards.saved_confirmation_card(&req.message, Utc::now());
    Json(state.gateway.send_card(&req.to, "Message saved", card).await)
}

/// POST /api/v1/send/image
pub async fn send_image(
    State(state): State<AppState>,
    Json(req): Json<SendMediaRequest>,
) -> Json<DeliveryResult> {
    Json(
        state
            .gateway
            .send_image(&req.to, &req.original_content_url, &req.preview_image_url)
            .await,
    )
}

/// POST /api/v1/send/video
pub async fn send_video(
    State(state): State<AppState>,
    Json(req): Json<SendMediaRequest>,
) -> Json<DeliveryResult> {
    Json(
        state
            .gateway
            .send_video(&req.to, &req.original_content_url, &req.preview_image_url)
            .await,
    )
}

/// POST /api/v1/send/audio
pub async fn send_audio(
    State(state): State<AppState>,
    Json(req): Json<SendAudioRequest>,
) -> Json<DeliveryResult> {
    Json(
        state
            .gateway
            .send_audio(&req.to, &req.original_content_url, req.duration)
            .await,
    )
}

/// POST /api/v1/send/location
pub async fn send_location(
    State(state): State<AppState>,
    Json(req): Json<SendLocationRequest>,
) -> Json<DeliveryResult> {
    Json(
        state
            .gateway
            .send_location(&req.to, &req.title, &req.address, req.latitude, req.longitude)
            .await,
    )
}

/// POST /api/v1/send/sticker
pub async fn send_sticker(
    State(state): State<AppState>,
    Json(req): Json<SendStickerRequest>,
) -> Json<DeliveryResult> {
    Json(
        state
            .gateway
            .send_sticker(&req.to, &req.package_id, &req.sticker_id)
            .await,
    )
}

/// POST /api/v1/send/card
pub async fn send_card(
    State(state): State<AppState>,
    Json(req): Json<SendCardRequest>,
) -> Json<DeliveryResult> {
    let result = match req.contents {
        Value::String(contents) => {
            state
                .gateway
                .send_card_json(&req.to, &req.alt_text, &contents)
                .await
        }
        contents => state.gateway.send_card(&req.to, &req.alt_text, contents).await,
    };
    Json(result)
}

/// POST /api/v1/multicast
pub async fn multicast(
    State(state): State<AppState>,
    Json(req): Json<MulticastRequest>,
) -> Json<DeliveryResult> {
    Json(state.gateway.multicast_text(&req.to, &req.message).await)
}

/// POST /api/v1/broadcast
pub async fn broadcast(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Json<DeliveryResult> {
    Json(state.gateway.broadcast_text(&req.message).await)
}

/// POST /api/v1/reply
///
/// Accepts either a single `message` or a `messages` list.
pub async fn reply(State(state): State<AppState>, Json(req): Json<ReplyRequest>) -> Response {
    if let Some(messages) = req.messages.filter(|m| !m.is_empty()) {
        return Json(state.gateway.reply_texts(&req.reply_token, &messages).await).into_response();
    }
    match req.message {
        Some(message) => {
            Json(state.gateway.reply_text(&req.reply_token, &message).await).into_response()
        }
        None => response::bad_request("Either 'message' or 'messages' is required").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::platform::OutboundMessage;
    use crate::platform::testing::{Call, MockPlatform};
    use crate::server::{AppState, build_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (axum::Router, Arc<MockPlatform>) {
        let platform = Arc::new(MockPlatform::default());
        let state = AppState::for_tests(platform.clone(), "");
        (build_app(state, 30), platform)
    }

    async fn post(app: axum::Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_send_text_wraps_message_in_saved_card() {
        let (app, platform) = app();

        let (status, body) = post(
            app,
            "/api/v1/send/text",
            r#"{"to":"u1","message":"note to self"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["sentMessages"], 1);

        match &platform.calls()[0] {
            Call::Push { to, messages } => {
                assert_eq!(to, "u1");
                match &messages[0] {
                    OutboundMessage::Flex { alt_text, contents } => {
                        assert_eq!(alt_text, "Message saved");
                        assert_eq!(contents["header"]["contents"][0]["text"], "EDIT");
                        assert_eq!(contents["body"]["contents"][2]["text"], "note to self");
                    }
                    other => panic!("expected flex push, got {other:?}"),
                }
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_card_accepts_object_or_string_contents() {
        let (app, platform) = app();

        let (status, body) = post(
            app.clone(),
            "/api/v1/send/card",
            r#"{"to":"u1","altText":"alt","contents":{"type":"bubble"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = post(
            app,
            "/api/v1/send/card",
            r#"{"to":"u1","altText":"alt","contents":"{\"type\":\"bubble\"}"}"#,
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(platform.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_send_card_with_malformed_string_contents_fails_cleanly() {
        let (app, platform) = app();

        let (status, body) = post(
            app,
            "/api/v1/send/card",
            r#"{"to":"u1","altText":"alt","contents":"{not json"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["sentMessages"], 0);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_multicast_and_broadcast_report_counts() {
        let (app, _) = app();

        let (_, body) = post(
            app.clone(),
            "/api/v1/multicast",
            r#"{"to":["u1","u2"],"message":"hi"}"#,
        )
        .await;
        assert_eq!(body["sentMessages"], 2);

        let (_, body) = post(app, "/api/v1/broadcast", r#"{"message":"hi"}"#).await;
        assert_eq!(body["sentMessages"], -1);
    }

    #[tokio::test]
    async fn test_reply_accepts_single_or_multiple_messages() {
        let (app, platform) = app();

        let (_, body) = post(
            app.clone(),
            "/api/v1/reply",
            r#"{"replyToken":"tok","message":"one"}"#,
        )
        .await;
        assert_eq!(body["sentMessages"], 1);

        let (_, body) = post(
            app.clone(),
            "/api/v1/reply",
            r#"{"replyToken":"tok","messages":["a","b","c"]}"#,
        )
        .await;
        assert_eq!(body["sentMessages"], 3);
        assert_eq!(platform.replies().len(), 2);

        let (status, _) = post(app, "/api/v1/reply", r#"{"replyToken":"tok"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
