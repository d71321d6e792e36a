use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use tower_http::timeout::TimeoutLayer;

use crate::cards::CardTemplates;
use crate::dispatch::Dispatcher;
use crate::gateway::MessagingGateway;
use crate::handlers;
use crate::store::MessageStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: MessageStore,
    pub gateway: MessagingGateway,
    pub cards: CardTemplates,
    pub dispatcher: Dispatcher,
    pub channel_secret: String,
    pub ocr_configured: bool,
    pub export_configured: bool,
}

impl AppState {
    /// State wired to a test platform: fresh store, disabled OCR and export.
    #[cfg(test)]
    pub fn for_tests(
        platform: std::sync::Arc<dyn crate::platform::PlatformClient>,
        channel_secret: &str,
    ) -> Self {
        let store = MessageStore::new();
        let gateway = MessagingGateway::new(platform);
        let cards = CardTemplates::new(
            "https://edit.example.com/app".to_string(),
            "https://list.example.com/app".to_string(),
        );
        let dispatcher = Dispatcher::new(
            store.clone(),
            gateway.clone(),
            cards.clone(),
            None,
            crate::export::SheetsExporter::disabled(),
        );
        Self {
            store,
            gateway,
            cards,
            dispatcher,
            channel_secret: channel_secret.to_string(),
            ocr_configured: false,
            export_configured: false,
        }
    }
}

pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    let api_v1 = Router::new()
        .route(
            "/messages",
            get(handlers::v1::list_messages).post(handlers::v1::add_message),
        )
        .route(
            "/messages/{id}",
            get(handlers::v1::get_message).put(handlers::v1::edit_message),
        )
        .route("/send/text", post(handlers::v1::send_text))
        .route("/send/image", post(handlers::v1::send_image))
        .route("/send/video", post(handlers::v1::send_video))
        .route("/send/audio", post(handlers::v1::send_audio))
        .route("/send/location", post(handlers::v1::send_location))
        .route("/send/sticker", post(handlers::v1::send_sticker))
        .route("/send/card", post(handlers::v1::send_card))
        .route("/multicast", post(handlers::v1::multicast))
        .route("/broadcast", post(handlers::v1::broadcast))
        .route("/reply", post(handlers::v1::reply))
        .route("/richmenus", post(handlers::v1::create_rich_menu))
        .route(
            "/richmenus/default",
            post(handlers::v1::set_default_rich_menu)
                .delete(handlers::v1::cancel_default_rich_menu),
        )
        .route("/richmenus/{id}", delete(handlers::v1::delete_rich_menu))
        .route(
            "/users/{user_id}/richmenu",
            post(handlers::v1::link_user_rich_menu).delete(handlers::v1::unlink_user_rich_menu),
        )
        .route(
            "/webhook-endpoint",
            get(handlers::v1::get_webhook_endpoint).put(handlers::v1::set_webhook_endpoint),
        )
        .route(
            "/webhook-endpoint/test",
            post(handlers::v1::test_webhook_endpoint),
        )
        .route("/groups/{id}/leave", post(handlers::v1::leave_group))
        .route("/rooms/{id}/leave", post(handlers::v1::leave_room));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/health", get(handlers::health))
        .route("/webhook", post(handlers::receive))
        .route("/webhook/test-verify", post(handlers::test_verify))
        .route("/webhook/test", post(handlers::test_event))
        .nest("/api/v1", api_v1)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
}
