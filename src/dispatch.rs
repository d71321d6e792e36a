//! Webhook event dispatcher.
//!
//! Fans an inbound event batch out across tasks and routes each event to its
//! per-type handler. Handlers share the message store but are otherwise
//! independent; one stalled or panicked handler never takes its siblings
//! down. Replies always resolve to a [`DeliveryResult`] value, degrading
//! through fallbacks instead of erroring.

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::cards::{CardKind, CardTemplates};
use crate::event::{Event, MessageContent, Source};
use crate::export::SheetsExporter;
use crate::gateway::{DeliveryResult, MessagingGateway};
use crate::ocr::OcrClient;
use crate::store::MessageStore;

/// Reply tokens that mark synthetic test traffic; the reply step is skipped
/// for them.
const TEST_REPLY_TOKENS: [&str; 2] = ["test-token-123", "test-reply-token"];

fn usable_reply_token(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty() && !TEST_REPLY_TOKENS.contains(t))
}

fn test_mode_result(note: &str) -> DeliveryResult {
    DeliveryResult {
        success: true,
        message: note.to_string(),
        sent_messages: 0,
    }
}

/// Routes inbound events to handlers wired to the store, gateway, card
/// templates, OCR client, and export sink.
#[derive(Clone)]
pub struct Dispatcher {
    store: MessageStore,
    gateway: MessagingGateway,
    cards: CardTemplates,
    ocr: Option<OcrClient>,
    exporter: SheetsExporter,
}

impl Dispatcher {
    pub fn new(
        store: MessageStore,
        gateway: MessagingGateway,
        cards: CardTemplates,
        ocr: Option<OcrClient>,
        exporter: SheetsExporter,
    ) -> Self {
        Self {
            store,
            gateway,
            cards,
            ocr,
            exporter,
        }
    }

    /// Handle a whole batch concurrently, one task per event. Results come
    /// back in batch order; a panicked handler yields `None` for its slot.
    pub async fn handle_events(&self, events: Vec<Event>) -> Vec<Option<DeliveryResult>> {
        let tasks: Vec<_> = events
            .into_iter()
            .map(|event| {
                let dispatcher = self.clone();
                tokio::spawn(async move { dispatcher.handle_event(event).await })
            })
            .collect();

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    warn!("event handler task failed: {e}");
                    None
                })
            })
            .collect()
    }

    /// Route one event. `None` means the event kind produces no reply
    /// (unfollow/leave/memberLeft) or is not recognized.
    pub async fn handle_event(&self, event: Event) -> Option<DeliveryResult> {
        debug!(?event, "received event");

        match event {
            Event::Message {
                reply_token,
                source,
                message,
            } => self.handle_message(reply_token.as_deref(), &source, message).await,
            Event::Follow { reply_token, source } => {
                info!("user {} followed the bot", source.sender_id());
                self.reply_or_skip(
                    reply_token.as_deref(),
                    "Welcome! 🎉\nThanks for adding me as a friend.",
                )
                .await
            }
            Event::Unfollow { source } => {
                // No reply channel exists for an unfollowed user.
                info!("user {} unfollowed the bot", source.sender_id());
                None
            }
            Event::Join { reply_token, source } => {
                info!(
                    "bot joined {}",
                    source.group_id.or(source.room_id).unwrap_or_default()
                );
                self.reply_or_skip(
                    reply_token.as_deref(),
                    "Hello! Thanks for inviting me to the group 🤖",
                )
                .await
            }
            Event::Leave { source } => {
                info!(
                    "bot left {}",
                    source.group_id.or(source.room_id).unwrap_or_default()
                );
                None
            }
            Event::MemberJoined { reply_token, .. } => {
                self.reply_or_skip(reply_token.as_deref(), "Welcome to our new member! 👋")
                    .await
            }
            Event::MemberLeft { .. } => None,
            Event::Postback {
                reply_token,
                source,
                postback,
            } => {
                self.handle_postback(reply_token.as_deref(), &source, &postback.data)
                    .await
            }
            Event::Beacon {
                reply_token, beacon, ..
            } => {
                info!("beacon event: {} from {}", beacon.kind, beacon.hwid);
                self.reply_or_skip(reply_token.as_deref(), "Beacon detected! 📡")
                    .await
            }
            Event::AccountLink {
                reply_token, link, ..
            } => {
                let text = if link.result == "ok" {
                    "Account linked successfully! ✅"
                } else {
                    "Account link failed ❌"
                };
                self.reply_or_skip(reply_token.as_deref(), text).await
            }
            Event::Things { reply_token, .. } => {
                self.reply_or_skip(reply_token.as_deref(), "Received data from your device! 🔗")
                    .await
            }
            Event::Unknown => {
                info!("unknown event type, ignoring");
                None
            }
        }
    }

    async fn handle_message(
        &self,
        reply_token: Option<&str>,
        source: &Source,
        message: MessageContent,
    ) -> Option<DeliveryResult> {
        match message {
            MessageContent::Text { text } => self.handle_text(reply_token, source, &text).await,
            MessageContent::Image { id } => self.handle_image(reply_token, source, &id).await,
            MessageContent::Video { .. } => {
                self.reply_or_skip(reply_token, "Video received! 🎥").await
            }
            MessageContent::Audio { .. } => {
                self.reply_or_skip(reply_token, "Audio received! 🎵").await
            }
            MessageContent::File { file_name, .. } => {
                self.reply_or_skip(reply_token, &format!("Got your file \"{file_name}\"! 📄"))
                    .await
            }
            MessageContent::Location { title, .. } => {
                let title = title.unwrap_or_default();
                self.reply_or_skip(reply_token, &format!("Location \"{title}\" received! 📍"))
                    .await
            }
            MessageContent::Sticker {
                package_id,
                sticker_id,
            } => {
                debug!("sticker {package_id}/{sticker_id}");
                self.reply_or_skip(reply_token, "Thanks for the sticker! 😊")
                    .await
            }
            MessageContent::Unknown => {
                info!("unknown message type, ignoring");
                None
            }
        }
    }

    /// Persist the text, forward it to the export sink, and reply with a
    /// Received card; fall back to a plain-text reply if the card fails.
    async fn handle_text(
        &self,
        reply_token: Option<&str>,
        source: &Source,
        text: &str,
    ) -> Option<DeliveryResult> {
        let user_id = source.sender_id();
        debug!("text message from {user_id}: {text}");

        let saved = self.store.add(text, &user_id).await;
        self.export_best_effort(text);

        let Some(token) = usable_reply_token(reply_token) else {
            debug!("test message, skipping reply");
            return Some(test_mode_result("Message received (test mode)"));
        };

        let card = self.cards.message_card(
            CardKind::Received,
            text,
            Some(&user_id),
            saved.timestamp,
            Some(&saved.id),
        );
        let alt_text = format!("Message received: {text}");
        let result = self.gateway.reply_card(token, &alt_text, card).await;
        if result.success {
            return Some(result);
        }

        warn!("card reply failed, falling back to plain text");
        let fallback = format!("Got your message: \"{text}\" ✅");
        Some(self.gateway.reply_text(token, &fallback).await)
    }

    /// Run the OCR pipeline for an image. Every failure mode degrades to a
    /// reply: transport errors become a warning card, and a card that cannot
    /// be delivered becomes a plain-text reply.
    async fn handle_image(
        &self,
        reply_token: Option<&str>,
        source: &Source,
        content_id: &str,
    ) -> Option<DeliveryResult> {
        let user_id = source.sender_id();
        debug!("image message from {user_id}, content id {content_id}");

        let Some(token) = usable_reply_token(reply_token) else {
            return Some(test_mode_result("Message received (test mode)"));
        };

        let Some(ocr) = self.ocr.clone() else {
            return Some(
                self.gateway
                    .reply_text(token, "Image received! 🖼️ (text recognition is not configured)")
                    .await,
            );
        };

        match self.run_ocr_flow(&ocr, token, &user_id, content_id).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("image processing failed: {e:#}");
                let text = format!("Error: {e}");
                let card =
                    self.cards
                        .message_card(CardKind::Ocr, &text, Some(&user_id), Utc::now(), None);
                let result = self
                    .gateway
                    .reply_card(token, "Failed to read text from the image", card)
                    .await;
                if result.success {
                    Some(result)
                } else {
                    Some(
                        self.gateway
                            .reply_text(
                                token,
                                "❌ Could not read text from the image, please try again.",
                            )
                            .await,
                    )
                }
            }
        }
    }

    async fn run_ocr_flow(
        &self,
        ocr: &OcrClient,
        token: &str,
        user_id: &str,
        content_id: &str,
    ) -> anyhow::Result<DeliveryResult> {
        let bytes = self
            .gateway
            .message_content(content_id)
            .await
            .context("failed to fetch image content")?;
        let encoded = BASE64.encode(&bytes);

        let recognized = ocr
            .recognize(&encoded)
            .await
            .context("text recognition failed")?;

        let found = !recognized.trim().is_empty();
        let text = if found {
            recognized
        } else {
            "No text found in the image".to_string()
        };

        let saved = self.store.add(&text, user_id).await;
        if found {
            self.export_best_effort(&text);
        }

        let card = self.cards.message_card(
            CardKind::Ocr,
            &text,
            Some(user_id),
            saved.timestamp,
            Some(&saved.id),
        );
        let alt_text = if found {
            let mut preview: String = text.chars().take(50).collect();
            if text.chars().count() > 50 {
                preview.push_str("...");
            }
            format!("Recognized text: {preview}")
        } else {
            "No text found in the image".to_string()
        };

        let result = self.gateway.reply_card(token, &alt_text, card).await;
        if result.success {
            return Ok(result);
        }

        warn!("OCR card reply failed, falling back to plain text");
        let fallback = if found {
            format!("📄 Text read from the image:\n\n{text}")
        } else {
            "❌ No text found in this image".to_string()
        };
        Ok(self.gateway.reply_text(token, &fallback).await)
    }

    /// Parse `action=<name>&<params>` postback data. The save actions
    /// persist the message and confirm with a card; anything else is echoed.
    async fn handle_postback(
        &self,
        reply_token: Option<&str>,
        source: &Source,
        data: &str,
    ) -> Option<DeliveryResult> {
        debug!("postback from {}: {data}", source.sender_id());

        let Some(token) = usable_reply_token(reply_token) else {
            debug!("test postback, skipping reply");
            return Some(test_mode_result("Postback received (test mode)"));
        };

        if let Some(params) = data.strip_prefix("action=save_and_open_liff&") {
            let (message, user_id, message_id) = parse_save_params(params);
            self.store.add(&message, &user_id).await;
            let card = self.cards.message_card(
                CardKind::Received,
                &message,
                non_empty(&user_id),
                Utc::now(),
                non_empty(&message_id),
            );
            return Some(self.gateway.reply_card(token, "Message saved", card).await);
        }

        if let Some(params) = data.strip_prefix("action=save_and_close_liff&") {
            let (message, user_id, _) = parse_save_params(params);
            let saved = self.store.add(&message, &user_id).await;
            let card = self.cards.message_card(
                CardKind::Edited,
                &message,
                non_empty(&user_id),
                saved.timestamp,
                Some(&saved.id),
            );
            return Some(
                self.gateway
                    .reply_card(token, "Message edited successfully", card)
                    .await,
            );
        }

        Some(
            self.gateway
                .reply_text(token, &format!("Postback received: {data}"))
                .await,
        )
    }

    async fn reply_or_skip(&self, reply_token: Option<&str>, text: &str) -> Option<DeliveryResult> {
        match usable_reply_token(reply_token) {
            Some(token) => Some(self.gateway.reply_text(token, text).await),
            None => Some(test_mode_result("Message received (test mode)")),
        }
    }

    /// Forward text to the export sink without waiting on it. The sink
    /// swallows its own failures, so the reply path cannot be affected.
    fn export_best_effort(&self, text: &str) {
        if !self.exporter.is_configured() {
            return;
        }
        let exporter = self.exporter.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let _ = exporter.append(&text).await;
        });
    }
}

fn parse_save_params(params: &str) -> (String, String, String) {
    let mut message = String::new();
    let mut user_id = String::new();
    let mut message_id = String::new();
    for (key, value) in form_urlencoded::parse(params.as_bytes()) {
        match key.as_ref() {
            "message" => message = value.into_owned(),
            "userId" => user_id = value.into_owned(),
            "messageId" => message_id = value.into_owned(),
            _ => {}
        }
    }
    (message, user_id, message_id)
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}
