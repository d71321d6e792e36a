//! Messaging gateway.
//!
//! Thin facade over [`PlatformClient`] that normalizes every operation to a
//! [`DeliveryResult`]. Delivery and admin errors never propagate out of this
//! module as `Err`; they are logged and folded into the result value so
//! callers always get something client-consumable.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::platform::{
    OutboundMessage, PlatformClient, PlatformError, RichMenuRequest, WebhookInfo,
};

/// Uniform outcome of every send/reply/admin operation.
///
/// `sent_messages` is the count of messages dispatched: 1 for push/reply,
/// the recipient count for multicast, `-1` for broadcast (count unknown),
/// and 0 for admin operations and failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    pub message: String,
    pub sent_messages: i32,
}

impl DeliveryResult {
    pub fn sent(note: &str, count: i32) -> Self {
        Self {
            success: true,
            message: note.to_string(),
            sent_messages: count,
        }
    }

    pub fn failed(action: &str, reason: impl std::fmt::Display) -> Self {
        warn!("failed to {action}: {reason}");
        Self {
            success: false,
            message: format!("Failed to {action}: {reason}"),
            sent_messages: 0,
        }
    }
}

/// Clonable gateway handle; all methods are infallible by construction.
#[derive(Clone)]
pub struct MessagingGateway {
    platform: Arc<dyn PlatformClient>,
}

impl MessagingGateway {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }

    async fn push_one(
        &self,
        to: &str,
        message: OutboundMessage,
        note: &str,
        action: &str,
    ) -> DeliveryResult {
        match self.platform.push(to, &[message]).await {
            Ok(()) => DeliveryResult::sent(note, 1),
            Err(e) => DeliveryResult::failed(action, e),
        }
    }

    // --- Push (one recipient) ---

    pub async fn send_text(&self, to: &str, text: &str) -> DeliveryResult {
        let message = OutboundMessage::Text {
            text: text.to_string(),
        };
        self.push_one(to, message, "Text message sent successfully", "send message")
            .await
    }

    pub async fn send_image(
        &self,
        to: &str,
        original_content_url: &str,
        preview_image_url: &str,
    ) -> DeliveryResult {
        let message = OutboundMessage::Image {
            original_content_url: original_content_url.to_string(),
            preview_image_url: preview_image_url.to_string(),
        };
        self.push_one(to, message, "Image message sent successfully", "send image")
            .await
    }

    pub async fn send_video(
        &self,
        to: &str,
        original_content_url: &str,
        preview_image_url: &str,
    ) -> DeliveryResult {
        let message = OutboundMessage::Video {
            original_content_url: original_content_url.to_string(),
            preview_image_url: preview_image_url.to_string(),
        };
        self.push_one(to, message, "Video message sent successfully", "send video")
            .await
    }

    pub async fn send_audio(&self, to: &str, original_content_url: &str, duration: u32) -> DeliveryResult {
        let message = OutboundMessage::Audio {
            original_content_url: original_content_url.to_string(),
            duration,
        };
        self.push_one(to, message, "Audio message sent successfully", "send audio")
            .await
    }

    pub async fn send_location(
        &self,
        to: &str,
        title: &str,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> DeliveryResult {
        let message = OutboundMessage::Location {
            title: title.to_string(),
            address: address.to_string(),
            latitude,
            longitude,
        };
        self.push_one(to, message, "Location message sent successfully", "send location")
            .await
    }

    pub async fn send_sticker(&self, to: &str, package_id: &str, sticker_id: &str) -> DeliveryResult {
        let message = OutboundMessage::Sticker {
            package_id: package_id.to_string(),
            sticker_id: sticker_id.to_string(),
        };
        self.push_one(to, message, "Sticker message sent successfully", "send sticker")
            .await
    }

    /// Push a rich card built as structured data.
    pub async fn send_card(&self, to: &str, alt_text: &str, contents: Value) -> DeliveryResult {
        let message = OutboundMessage::Flex {
            alt_text: alt_text.to_string(),
            contents,
        };
        self.push_one(to, message, "Flex message sent successfully", "send flex message")
            .await
    }

    /// Push a rich card supplied as a JSON string. Malformed JSON takes the
    /// same failure path as a delivery error.
    pub async fn send_card_json(&self, to: &str, alt_text: &str, contents: &str) -> DeliveryResult {
        match serde_json::from_str::<Value>(contents) {
            Ok(contents) => self.send_card(to, alt_text, contents).await,
            Err(e) => DeliveryResult::failed("send flex message", e),
        }
    }

    // --- Reply ---

    pub async fn reply_text(&self, reply_token: &str, text: &str) -> DeliveryResult {
        let message = OutboundMessage::Text {
            text: text.to_string(),
        };
        match self.platform.reply(reply_token, &[message]).await {
            Ok(()) => DeliveryResult::sent("Reply sent successfully", 1),
            Err(e) => DeliveryResult::failed("reply", e),
        }
    }

    pub async fn reply_texts(&self, reply_token: &str, texts: &[String]) -> DeliveryResult {
        let messages: Vec<OutboundMessage> = texts
            .iter()
            .map(|text| OutboundMessage::Text { text: text.clone() })
            .collect();
        match self.platform.reply(reply_token, &messages).await {
            Ok(()) => DeliveryResult::sent("Multiple replies sent successfully", texts.len() as i32),
            Err(e) => DeliveryResult::failed("reply", e),
        }
    }

    pub async fn reply_card(&self, reply_token: &str, alt_text: &str, contents: Value) -> DeliveryResult {
        let message = OutboundMessage::Flex {
            alt_text: alt_text.to_string(),
            contents,
        };
        match self.platform.reply(reply_token, &[message]).await {
            Ok(()) => DeliveryResult::sent("Flex reply sent successfully", 1),
            Err(e) => DeliveryResult::failed("reply with flex message", e),
        }
    }

    // --- Multicast / broadcast ---

    pub async fn multicast_text(&self, to: &[String], text: &str) -> DeliveryResult {
        let message = OutboundMessage::Text {
            text: text.to_string(),
        };
        match self.platform.multicast(to, &[message]).await {
            Ok(()) => DeliveryResult::sent("Multicast message sent successfully", to.len() as i32),
            Err(e) => DeliveryResult::failed("multicast", e),
        }
    }

    pub async fn broadcast_text(&self, text: &str) -> DeliveryResult {
        let message = OutboundMessage::Text {
            text: text.to_string(),
        };
        match self.platform.broadcast(&[message]).await {
            Ok(()) => DeliveryResult::sent("Broadcast message sent successfully", -1),
            Err(e) => DeliveryResult::failed("broadcast", e),
        }
    }

    // --- Content ---

    /// Download message content. The OCR flow needs the raw bytes, so this
    /// one keeps the `Result`; the caller folds failures into its own reply.
    pub async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, PlatformError> {
        self.platform.message_content(message_id).await
    }

    // --- Rich menu administration ---

    pub async fn create_rich_menu(&self, menu: &RichMenuRequest) -> DeliveryResult {
        match self.platform.create_rich_menu(menu).await {
            Ok(id) => DeliveryResult::sent(&format!("Rich menu created: {id}"), 0),
            Err(e) => DeliveryResult::failed("create rich menu", e),
        }
    }

    pub async fn delete_rich_menu(&self, rich_menu_id: &str) -> DeliveryResult {
        match self.platform.delete_rich_menu(rich_menu_id).await {
            Ok(()) => DeliveryResult::sent("Rich menu deleted successfully", 0),
            Err(e) => DeliveryResult::failed("delete rich menu", e),
        }
    }

    pub async fn link_rich_menu_to_user(&self, user_id: &str, rich_menu_id: &str) -> DeliveryResult {
        match self.platform.link_rich_menu_to_user(user_id, rich_menu_id).await {
            Ok(()) => DeliveryResult::sent("Rich menu linked to user successfully", 0),
            Err(e) => DeliveryResult::failed("link rich menu", e),
        }
    }

    pub async fn unlink_rich_menu_from_user(&self, user_id: &str) -> DeliveryResult {
        match self.platform.unlink_rich_menu_from_user(user_id).await {
            Ok(()) => DeliveryResult::sent("Rich menu unlinked from user successfully", 0),
            Err(e) => DeliveryResult::failed("unlink rich menu", e),
        }
    }

    pub async fn set_default_rich_menu(&self, rich_menu_id: &str) -> DeliveryResult {
        match self.platform.set_default_rich_menu(rich_menu_id).await {
            Ok(()) => DeliveryResult::sent("Default rich menu set successfully", 0),
            Err(e) => DeliveryResult::failed("set default rich menu", e),
        }
    }

    pub async fn cancel_default_rich_menu(&self) -> DeliveryResult {
        match self.platform.delete_default_rich_menu().await {
            Ok(()) => DeliveryResult::sent("Default rich menu cancelled successfully", 0),
            Err(e) => DeliveryResult::failed("cancel default rich menu", e),
        }
    }

    // --- Webhook administration ---

    pub async fn webhook_info(&self) -> Result<WebhookInfo, PlatformError> {
        self.platform.webhook_endpoint().await
    }

    pub async fn set_webhook_endpoint(&self, endpoint: &str) -> DeliveryResult {
        match self.platform.set_webhook_endpoint(endpoint).await {
            Ok(()) => DeliveryResult::sent("Webhook endpoint set successfully", 0),
            Err(e) => DeliveryResult::failed("set webhook endpoint", e),
        }
    }

    pub async fn test_webhook(&self, endpoint: Option<&str>) -> DeliveryResult {
        match self.platform.test_webhook_endpoint(endpoint).await {
            Ok(()) => DeliveryResult::sent("Webhook test successful", 0),
            Err(e) => {
                warn!("webhook test failed: {e}");
                DeliveryResult {
                    success: false,
                    message: format!("Webhook test failed: {e}"),
                    sent_messages: 0,
                }
            }
        }
    }

    // --- Group / room ---

    pub async fn leave_group(&self, group_id: &str) -> DeliveryResult {
        match self.platform.leave_group(group_id).await {
            Ok(()) => DeliveryResult::sent("Left group successfully", 0),
            Err(e) => DeliveryResult::failed("leave group", e),
        }
    }

    pub async fn leave_room(&self, room_id: &str) -> DeliveryResult {
        match self.platform.leave_room(room_id).await {
            Ok(()) => DeliveryResult::sent("Left room successfully", 0),
            Err(e) => DeliveryResult::failed("leave room", e),
        }
    }
}
