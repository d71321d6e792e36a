//! Inbound webhook event model.
//!
//! Events arrive as an internally tagged union over the platform's event
//! kinds. Both tag levels close over an explicit `Unknown` variant, so a new
//! platform event degrades to "ignored" instead of a deserialization error.

use serde::Deserialize;

/// Where an event came from: a user, a group, or a room.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl Source {
    /// The sender id used for persistence, falling back for events the
    /// platform delivers without one.
    pub fn sender_id(&self) -> String {
        self.user_id
            .clone()
            .unwrap_or_else(|| "unknown-user".to_string())
    }
}

/// Content carried by a `message` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Image {
        id: String,
    },
    Video {
        id: String,
    },
    Audio {
        id: String,
    },
    File {
        id: String,
        file_name: String,
    },
    Location {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    #[serde(other)]
    Unknown,
}

/// Postback payload, an `action=<name>&<urlencoded params>` string.
#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    pub data: String,
}

/// Beacon proximity event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Beacon {
    pub hwid: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Account-link completion payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountLink {
    pub result: String,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// One inbound webhook event. Consumed exactly once by the dispatcher and
/// never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    Message {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
        message: MessageContent,
    },
    Follow {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
    },
    Unfollow {
        #[serde(default)]
        source: Source,
    },
    Join {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
    },
    Leave {
        #[serde(default)]
        source: Source,
    },
    MemberJoined {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
    },
    MemberLeft {
        #[serde(default)]
        source: Source,
    },
    Postback {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
        postback: Postback,
    },
    Beacon {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
        beacon: Beacon,
    },
    AccountLink {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
        link: AccountLink,
    },
    Things {
        #[serde(default)]
        reply_token: Option<String>,
        #[serde(default)]
        source: Source,
    },
    #[serde(other)]
    Unknown,
}
