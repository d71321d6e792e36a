//! Rich card templates.
//!
//! Pure builders producing the bubble/box/text node trees the platform
//! renders as message cards. Nothing here does I/O; every card is built
//! fresh from its arguments.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use url::form_urlencoded;

/// Which card variant to render. Controls the header label and color plus
/// the body wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    /// A freshly received text message (green header).
    Received,
    /// An edited message confirmation (orange header).
    Edited,
    /// An OCR result for an image (blue header).
    Ocr,
}

impl CardKind {
    pub fn label(self) -> &'static str {
        match self {
            CardKind::Received => "TEXT",
            CardKind::Edited => "EDIT",
            CardKind::Ocr => "OCR",
        }
    }

    pub fn header_color(self) -> &'static str {
        match self {
            CardKind::Received => "#27AE60",
            CardKind::Edited => "#F39C12",
            CardKind::Ocr => "#3498DB",
        }
    }

    fn status_text(self) -> &'static str {
        match self {
            CardKind::Received => "Success ✅",
            CardKind::Edited => "Edit saved ✅",
            CardKind::Ocr => "Success ✅",
        }
    }

    fn body_label(self) -> &'static str {
        match self {
            CardKind::Received | CardKind::Edited => "📋 Received message:",
            CardKind::Ocr => "📋 Recognized text:",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            CardKind::Received | CardKind::Edited => "No message",
            CardKind::Ocr => "No text could be read",
        }
    }
}

/// Format an instant for display inside a card, `DD/MM/YY HH:MM`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%y %H:%M").to_string()
}

/// Card builders bound to the edit/list front-end base URLs.
#[derive(Debug, Clone)]
pub struct CardTemplates {
    edit_url: String,
    list_url: String,
}

impl CardTemplates {
    pub fn new(edit_url: String, list_url: String) -> Self {
        Self { edit_url, list_url }
    }

    /// Build the standard message card: status line, the message text in a
    /// highlighted box, a formatted timestamp, and EDIT/LIST action buttons.
    pub fn message_card(
        &self,
        kind: CardKind,
        text: &str,
        user_id: Option<&str>,
        timestamp: DateTime<Utc>,
        message_id: Option<&str>,
    ) -> Value {
        let display_text = if text.is_empty() {
            kind.placeholder()
        } else {
            text
        };

        json!({
            "type": "bubble",
            "size": "kilo",
            "header": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text", "text": kind.label(), "weight": "bold", "size": "lg",
                      "color": "#FFFFFF", "align": "center" }
                ],
                "backgroundColor": kind.header_color(),
                "paddingAll": "md"
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "spacing": "md",
                "paddingAll": "lg",
                "contents": [
                    { "type": "box", "layout": "horizontal", "contents": [
                        { "type": "text", "text": "📊 Status:", "size": "sm", "color": "#666666", "flex": 2 },
                        { "type": "text", "text": kind.status_text(), "size": "sm", "color": "#27AE60",
                          "flex": 3, "weight": "bold" }
                    ]},
                    { "type": "separator", "margin": "lg" },
                    { "type": "text", "text": kind.body_label(), "size": "sm", "color": "#666666", "margin": "lg" },
                    { "type": "box", "layout": "vertical", "contents": [
                        { "type": "text", "text": display_text, "size": "md", "color": "#333333",
                          "wrap": true, "align": "center" }
                    ],
                      "backgroundColor": "#F5F5F5", "cornerRadius": "8px", "paddingAll": "md", "margin": "sm" },
                    { "type": "separator", "margin": "lg" },
                    { "type": "box", "layout": "horizontal", "contents": [
                        { "type": "text", "text": "🕒 Time:", "size": "sm", "color": "#666666", "flex": 2 },
                        { "type": "text", "text": format_timestamp(timestamp), "size": "sm",
                          "color": "#333333", "flex": 3 }
                    ]}
                ]
            },
            "footer": {
                "type": "box",
                "layout": "horizontal",
                "spacing": "sm",
                "contents": [
                    { "type": "button",
                      "action": { "type": "uri", "label": "📝 EDIT",
                                  "uri": self.edit_link(text, user_id, message_id) },
                      "style": "primary", "color": "#E74C3C", "height": "sm", "flex": 1 },
                    { "type": "button",
                      "action": { "type": "uri", "label": "📋 LIST", "uri": self.list_url },
                      "style": "primary", "color": "#000000", "height": "sm", "flex": 1 }
                ],
                "paddingAll": "md"
            }
        })
    }

    /// Compact confirmation card used by the send/edit text API: orange EDIT
    /// header, a saved banner, the text, and the timestamp. No footer buttons.
    pub fn saved_confirmation_card(&self, text: &str, timestamp: DateTime<Utc>) -> Value {
        json!({
            "type": "bubble",
            "header": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text", "text": "EDIT", "weight": "bold", "size": "lg",
                      "color": "#FFFFFF", "align": "center" }
                ],
                "backgroundColor": "#F39C12",
                "paddingAll": "md"
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text", "text": "Message saved ✅", "weight": "bold",
                      "color": "#27AE60", "margin": "md" },
                    { "type": "separator", "margin": "lg" },
                    { "type": "text", "text": text, "wrap": true, "color": "#333333", "margin": "lg" },
                    { "type": "separator", "margin": "lg" },
                    { "type": "box", "layout": "horizontal", "contents": [
                        { "type": "text", "text": "🕒 Time:", "size": "sm", "color": "#666666", "flex": 2 },
                        { "type": "text", "text": format_timestamp(timestamp), "size": "sm",
                          "color": "#333333", "flex": 3 }
                    ]}
                ]
            }
        })
    }

    /// Deep link to the edit front-end. Falls back to the bare URL when the
    /// message or user id is missing.
    fn edit_link(&self, text: &str, user_id: Option<&str>, message_id: Option<&str>) -> String {
        match (user_id, message_id) {
            (Some(user_id), Some(message_id)) if !user_id.is_empty() && !message_id.is_empty() => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair("message", text)
                    .append_pair("userId", user_id)
                    .append_pair("messageId", message_id)
                    .finish();
                format!("{}?{}", self.edit_url, query)
            }
            _ => self.edit_url.clone(),
        }
    }
}
