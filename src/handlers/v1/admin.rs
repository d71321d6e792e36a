//! Platform administration HTTP handlers: rich menus, the registered
//! webhook endpoint, and leaving groups/rooms.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::gateway::DeliveryResult;
use crate::platform::RichMenuRequest;
use crate::response;
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichMenuIdRequest {
    rich_menu_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEndpointRequest {
    endpoint: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestWebhookRequest {
    #[serde(default)]
    endpoint: Option<String>,
}

/// POST /api/v1/richmenus
pub async fn create_rich_menu(
    State(state): State<AppState>,
    Json(menu): Json<RichMenuRequest>,
) -> Json<DeliveryResult> {
    Json(state.gateway.create_rich_menu(&menu).await)
}

/// DELETE /api/v1/richmenus/{id}
pub async fn delete_rich_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DeliveryResult> {
    Json(state.gateway.delete_rich_menu(&id).await)
}

/// POST /api/v1/richmenus/default
pub async fn set_default_rich_menu(
    State(state): State<AppState>,
    Json(req): Json<RichMenuIdRequest>,
) -> Json<DeliveryResult> {
    Json(state.gateway.set_default_rich_menu(&req.rich_menu_id).await)
}

/// DELETE /api/v1/richmenus/default
pub async fn cancel_default_rich_menu(State(state): State<AppState>) -> Json<DeliveryResult> {
    Json(state.gateway.cancel_default_rich_menu().await)
}

/// POST /api/v1/users/{userId}/richmenu
pub async fn link_user_rich_menu(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<RichMenuIdRequest>,
) -> Json<DeliveryResult> {
    Json(
        state
            .gateway
            .link_rich_menu_to_user(&user_id, &req.rich_menu_id)
            .await,
    )
}

/// DELETE /api/v1/users/{userId}/richmenu
pub async fn unlink_user_rich_menu(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<DeliveryResult> {
    Json(state.gateway.unlink_rich_menu_from_user(&user_id).await)
}

/// GET /api/v1/webhook-endpoint
pub async fn get_webhook_endpoint(State(state): State<AppState>) -> Response {
    match state.gateway.webhook_info().await {
        Ok(info) => Json(info).into_response(),
        Err(e) => {
            response::internal_error(format!("Failed to get webhook info: {e}")).into_response()
        }
    }
}

/// PUT /api/v1/webhook-endpoint
pub async fn set_webhook_endpoint(
    State(state): State<AppState>,
    Json(req): Json<WebhookEndpointRequest>,
) -> Json<DeliveryResult> {
    Json(state.gateway.set_webhook_endpoint(&req.endpoint).await)
}

/// POST /api/v1/webhook-endpoint/test
///
/// Body is optional; without one the platform probes the registered endpoint.
pub async fn test_webhook_endpoint(
    State(state): State<AppState>,
    req: Option<Json<TestWebhookRequest>>,
) -> Json<DeliveryResult> {
    let endpoint = req.and_then(|Json(req)| req.endpoint);
    Json(state.gateway.test_webhook(endpoint.as_deref()).await)
}

/// POST /api/v1/groups/{id}/leave
pub async fn leave_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DeliveryResult> {
    Json(state.gateway.leave_group(&id).await)
}

/// POST /api/v1/rooms/{id}/leave
pub async fn leave_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DeliveryResult> {
    Json(state.gateway.leave_room(&id).await)
}

#[cfg(test)]
mod tests {
    use crate::platform::testing::{Call, MockPlatform};
    use crate::server::{AppState, build_app};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (axum::Router, Arc<MockPlatform>) {
        let platform = Arc::new(MockPlatform::default());
        let state = AppState::for_tests(platform.clone(), "");
        (build_app(state, 30), platform)
    }

    async fn request(
        app: axum::Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_rich_menu_lifecycle_routes() {
        let (app, platform) = app();

        let menu = r#"{
            "size": {"width": 2500, "height": 1686},
            "selected": false,
            "name": "main",
            "chatBarText": "Menu",
            "areas": []
        }"#;
        let (status, body) = request(
            app.clone(),
            Method::POST,
            "/api/v1/richmenus",
            Some(menu),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rich menu created: richmenu-1");

        let (_, body) = request(
            app.clone(),
            Method::DELETE,
            "/api/v1/richmenus/richmenu-1",
            None,
        )
        .await;
        assert_eq!(body["success"], true);

        let (_, body) = request(
            app.clone(),
            Method::POST,
            "/api/v1/richmenus/default",
            Some(r#"{"richMenuId":"richmenu-1"}"#),
        )
        .await;
        assert_eq!(body["message"], "Default rich menu set successfully");

        let (_, body) = request(
            app.clone(),
            Method::POST,
            "/api/v1/users/u1/richmenu",
            Some(r#"{"richMenuId":"richmenu-1"}"#),
        )
        .await;
        assert_eq!(body["success"], true);

        let (_, body) =
            request(app, Method::DELETE, "/api/v1/users/u1/richmenu", None).await;
        assert_eq!(body["success"], true);

        let operations: Vec<String> = platform
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Admin { operation } => Some(operation),
                _ => None,
            })
            .collect();
        assert_eq!(
            operations,
            [
                "create_rich_menu",
                "delete_rich_menu",
                "set_default_rich_menu",
                "link_rich_menu_to_user",
                "unlink_rich_menu_from_user",
            ]
        );
    }

    #[tokio::test]
    async fn test_webhook_endpoint_admin_routes() {
        let (app, _) = app();

        let (status, body) =
            request(app.clone(), Method::GET, "/api/v1/webhook-endpoint", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoint"], "https://bot.example.com/webhook");
        assert_eq!(body["active"], true);

        let (_, body) = request(
            app.clone(),
            Method::PUT,
            "/api/v1/webhook-endpoint",
            Some(r#"{"endpoint":"https://new.example.com/webhook"}"#),
        )
        .await;
        assert_eq!(body["message"], "Webhook endpoint set successfully");

        let (_, body) = request(
            app,
            Method::POST,
            "/api/v1/webhook-endpoint/test",
            None,
        )
        .await;
        assert_eq!(body["message"], "Webhook test successful");
    }

    #[tokio::test]
    async fn test_leave_routes() {
        let (app, _) = app();

        let (_, body) = request(
            app.clone(),
            Method::POST,
            "/api/v1/groups/g1/leave",
            None,
        )
        .await;
        assert_eq!(body["message"], "Left group successfully");

        let (_, body) = request(app, Method::POST, "/api/v1/rooms/r1/leave", None).await;
        assert_eq!(body["message"], "Left room successfully");
    }

    #[tokio::test]
    async fn test_failing_platform_surfaces_in_result_body_not_status() {
        let platform = Arc::new(MockPlatform::failing());
        let state = AppState::for_tests(platform, "");
        let app = build_app(state, 30);

        let (status, body) = request(
            app,
            Method::POST,
            "/api/v1/groups/g1/leave",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to leave group: ")
        );
    }
}
