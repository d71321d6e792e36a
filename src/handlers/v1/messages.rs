//! Message store HTTP handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use crate::cards::CardKind;
use crate::response;
use crate::server::AppState;
use crate::store::{ListQuery, Message};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageRequest {
    text: String,
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageRequest {
    text: String,
}

/// GET /api/v1/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Message>> {
    Json(state.store.list(&query).await)
}

/// GET /api/v1/messages/{id}
pub async fn get_message(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_by_id(&id).await {
        Some(message) => (StatusCode::OK, Json(message)).into_response(),
        None => response::not_found("Message not found").into_response(),
    }
}

/// POST /api/v1/messages
pub async fn add_message(
    State(state): State<AppState>,
    Json(req): Json<AddMessageRequest>,
) -> (StatusCode, Json<Message>) {
    let message = state.store.add(&req.text, &req.user_id).await;
    (StatusCode::OK, Json(message))
}

/// PUT /api/v1/messages/{id}
///
/// Edits the stored text and pushes an edit-confirmation card to the
/// message's owner. The push is best effort; its outcome never changes the
/// response.
pub async fn edit_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EditMessageRequest>,
) -> Response {
    let Some(updated) = state.store.edit(&id, &req.text).await else {
        return response::not_found("Message not found").into_response();
    };
    debug!("message {} edited", updated.id);

    let card = state.cards.message_card(
        CardKind::Edited,
        &updated.text,
        Some(&updated.user_id),
        updated.timestamp,
        Some(&updated.id),
    );
    let gateway = state.gateway.clone();
    let user_id = updated.user_id.clone();
    tokio::spawn(async move {
        gateway
            .send_card(&user_id, "Message edited successfully", card)
            .await;
    });

    (StatusCode::OK, Json(updated)).into_response()
}

#[cfg(test)]
mod tests {
    use crate::platform::testing::MockPlatform;
    use crate::server::{AppState, build_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (axum::Router, crate::store::MessageStore) {
        let state = AppState::for_tests(Arc::new(MockPlatform::default()), "");
        let store = state.store.clone();
        (build_app(state, 30), store)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get_round_trips() {
        let (app, _) = app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/messages")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"hello","userId":"u1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        assert_eq!(created["id"], "1");
        assert_eq!(created["text"], "hello");
        assert_eq!(created["userId"], "u1");

        let response = app
            .oneshot(
                Request::get("/api/v1/messages/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["text"], "hello");
    }

    #[tokio::test]
    async fn test_get_unknown_message_is_404() {
        let (app, _) = app();

        let response = app
            .oneshot(
                Request::get("/api/v1/messages/99")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Message not found"
        );
    }

    #[tokio::test]
    async fn test_list_respects_query_parameters() {
        let (app, store) = app();
        store.add("a", "u1").await;
        store.add("b", "u2").await;
        store.add("c", "u1").await;

        let response = app
            .oneshot(
                Request::get("/api/v1/messages?userId=u1&orderBy=id&order=DESC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], "3");
        assert_eq!(list[1]["id"], "1");
    }

    #[tokio::test]
    async fn test_edit_updates_record_and_404s_on_unknown_id() {
        let (app, store) = app();
        store.add("before", "u1").await;

        let response = app
            .clone()
            .oneshot(
                Request::put("/api/v1/messages/1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"after"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["text"], "after");
        assert_eq!(store.get_by_id("1").await.unwrap().text, "after");

        let response = app
            .oneshot(
                Request::put("/api/v1/messages/42")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
