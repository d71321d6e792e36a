//! Messaging platform client.
//!
//! [`PlatformClient`] is the seam between the service and the platform's
//! bot REST API. The production implementation lives in [`rest`]; tests use
//! the mock in [`testing`].

mod rest;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use rest::RestClient;

/// Errors from platform API calls.
#[derive(Debug)]
pub enum PlatformError {
    /// HTTP request failed
    Request(reqwest::Error),
    /// API returned an error response
    Api { status: u16, message: String },
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Request(e) => write!(f, "HTTP request failed: {e}"),
            PlatformError::Api { status, message } => {
                write!(f, "API error (status {status}): {message}")
            }
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        PlatformError::Request(err)
    }
}

/// An outbound message payload, tagged the way the platform wire format
/// expects (`{"type": "text", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    Text {
        text: String,
    },
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
    Video {
        original_content_url: String,
        preview_image_url: String,
    },
    Audio {
        original_content_url: String,
        duration: u32,
    },
    Location {
        title: String,
        address: String,
        latitude: f64,
        longitude: f64,
    },
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    Flex {
        alt_text: String,
        contents: Value,
    },
}

/// Rich menu definition passed through to the platform.
///
/// `size` and `areas` stay as raw JSON; the platform validates their shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichMenuRequest {
    pub size: Value,
    pub selected: bool,
    pub name: String,
    pub chat_bar_text: String,
    pub areas: Value,
}

/// Registered webhook endpoint, as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfo {
    pub endpoint: String,
    pub active: bool,
}

/// Low-level platform operations. Every method maps to one API call and
/// propagates failures as [`PlatformError`]; result normalization happens
/// one layer up in the gateway.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Push messages to a user, group, or room id.
    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), PlatformError>;

    /// Reply to an event using its single-use reply token.
    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), PlatformError>;

    /// Push the same messages to several recipients at once.
    async fn multicast(
        &self,
        to: &[String],
        messages: &[OutboundMessage],
    ) -> Result<(), PlatformError>;

    /// Push the same messages to every follower.
    async fn broadcast(&self, messages: &[OutboundMessage]) -> Result<(), PlatformError>;

    /// Download the binary content attached to a message (images, files).
    async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, PlatformError>;

    /// Create a rich menu, returning its id.
    async fn create_rich_menu(&self, menu: &RichMenuRequest) -> Result<String, PlatformError>;

    async fn delete_rich_menu(&self, rich_menu_id: &str) -> Result<(), PlatformError>;

    async fn link_rich_menu_to_user(
        &self,
        user_id: &str,
        rich_menu_id: &str,
    ) -> Result<(), PlatformError>;

    async fn unlink_rich_menu_from_user(&self, user_id: &str) -> Result<(), PlatformError>;

    async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<(), PlatformError>;

    async fn delete_default_rich_menu(&self) -> Result<(), PlatformError>;

    async fn webhook_endpoint(&self) -> Result<WebhookInfo, PlatformError>;

    async fn set_webhook_endpoint(&self, endpoint: &str) -> Result<(), PlatformError>;

    /// Ask the platform to probe the given endpoint (or the registered one).
    async fn test_webhook_endpoint(&self, endpoint: Option<&str>) -> Result<(), PlatformError>;

    async fn leave_group(&self, group_id: &str) -> Result<(), PlatformError>;

    async fn leave_room(&self, room_id: &str) -> Result<(), PlatformError>;
}

#[cfg(test)]
pub mod testing {
    //! Recording mock used by gateway, dispatcher, and handler tests.

    use std::sync::Mutex;

    use super::*;

    /// One recorded platform call.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Push { to: String, messages: Vec<OutboundMessage> },
        Reply { reply_token: String, messages: Vec<OutboundMessage> },
        Multicast { to: Vec<String>, messages: Vec<OutboundMessage> },
        Broadcast { messages: Vec<OutboundMessage> },
        MessageContent { message_id: String },
        Admin { operation: String },
    }

    /// Mock platform that records calls and optionally fails everything.
    #[derive(Default)]
    pub struct MockPlatform {
        pub fail: bool,
        pub content: Vec<u8>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl MockPlatform {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn replies(&self) -> Vec<(String, Vec<OutboundMessage>)> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Reply {
                        reply_token,
                        messages,
                    } => Some((reply_token, messages)),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) -> Result<(), PlatformError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(PlatformError::Api {
                    status: 500,
                    message: "simulated platform failure".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PlatformClient for MockPlatform {
        async fn push(
            &self,
            to: &str,
            messages: &[OutboundMessage],
        ) -> Result<(), PlatformError> {
            self.record(Call::Push {
                to: to.to_string(),
                messages: messages.to_vec(),
            })
        }

        async fn reply(
            &self,
            reply_token: &str,
            messages: &[OutboundMessage],
        ) -> Result<(), PlatformError> {
            self.record(Call::Reply {
                reply_token: reply_token.to_string(),
                messages: messages.to_vec(),
            })
        }

        async fn multicast(
            &self,
            to: &[String],
            messages: &[OutboundMessage],
        ) -> Result<(), PlatformError> {
            self.record(Call::Multicast {
                to: to.to_vec(),
                messages: messages.to_vec(),
            })
        }

        async fn broadcast(&self, messages: &[OutboundMessage]) -> Result<(), PlatformError> {
            self.record(Call::Broadcast {
                messages: messages.to_vec(),
            })
        }

        async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, PlatformError> {
            self.record(Call::MessageContent {
                message_id: message_id.to_string(),
            })?;
            Ok(self.content.clone())
        }

        async fn create_rich_menu(
            &self,
            _menu: &RichMenuRequest,
        ) -> Result<String, PlatformError> {
            self.record(Call::Admin {
                operation: "create_rich_menu".to_string(),
            })?;
            Ok("richmenu-1".to_string())
        }

        async fn delete_rich_menu(&self, _rich_menu_id: &str) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "delete_rich_menu".to_string(),
            })
        }

        async fn link_rich_menu_to_user(
            &self,
            _user_id: &str,
            _rich_menu_id: &str,
        ) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "link_rich_menu_to_user".to_string(),
            })
        }

        async fn unlink_rich_menu_from_user(&self, _user_id: &str) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "unlink_rich_menu_from_user".to_string(),
            })
        }

        async fn set_default_rich_menu(&self, _rich_menu_id: &str) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "set_default_rich_menu".to_string(),
            })
        }

        async fn delete_default_rich_menu(&self) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "delete_default_rich_menu".to_string(),
            })
        }

        async fn webhook_endpoint(&self) -> Result<WebhookInfo, PlatformError> {
            self.record(Call::Admin {
                operation: "webhook_endpoint".to_string(),
            })?;
            Ok(WebhookInfo {
                endpoint: "https://bot.example.com/webhook".to_string(),
                active: true,
            })
        }

        async fn set_webhook_endpoint(&self, _endpoint: &str) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "set_webhook_endpoint".to_string(),
            })
        }

        async fn test_webhook_endpoint(
            &self,
            _endpoint: Option<&str>,
        ) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "test_webhook_endpoint".to_string(),
            })
        }

        async fn leave_group(&self, _group_id: &str) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "leave_group".to_string(),
            })
        }

        async fn leave_room(&self, _room_id: &str) -> Result<(), PlatformError> {
            self.record(Call::Admin {
                operation: "leave_room".to_string(),
            })
        }
    }
}
