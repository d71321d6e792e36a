//! In-memory message store.
//!
//! Messages are owned exclusively by the store; handlers get clones back.
//! Ids are stringified monotonic counters starting at 1, assigned under the
//! write lock so concurrent adds never collide.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Field to sort a message listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    #[default]
    Timestamp,
    Id,
    Text,
    UserId,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Filter/sort/paginate options for [`MessageStore::list`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub order: Order,
}

#[derive(Debug)]
struct Inner {
    messages: Vec<Message>,
    next_id: u64,
}

/// Clonable handle to the shared message store.
#[derive(Debug, Clone)]
pub struct MessageStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                messages: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Append a new message, allocating the next id and stamping the current time.
    pub async fn add(&self, text: &str, user_id: &str) -> Message {
        let mut inner = self.inner.write().await;
        let message = Message {
            id: inner.next_id.to_string(),
            text: text.to_string(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
        };
        inner.next_id += 1;
        inner.messages.push(message.clone());
        message
    }

    /// Replace the text of an existing message and refresh its timestamp.
    ///
    /// Returns `None` when no message has the given id; the store is left
    /// unchanged in that case.
    pub async fn edit(&self, id: &str, new_text: &str) -> Option<Message> {
        let mut inner = self.inner.write().await;
        let message = inner.messages.iter_mut().find(|m| m.id == id)?;
        message.text = new_text.to_string();
        message.timestamp = Utc::now();
        Some(message.clone())
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Message> {
        let inner = self.inner.read().await;
        inner.messages.iter().find(|m| m.id == id).cloned()
    }

    /// Filtered, sorted, truncated snapshot of the stored messages.
    ///
    /// The sort is stable, so equal keys keep their insertion order.
    /// Timestamps compare as instants; every other field compares as a string.
    pub async fn list(&self, query: &ListQuery) -> Vec<Message> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = match &query.user_id {
            Some(user_id) => inner
                .messages
                .iter()
                .filter(|m| &m.user_id == user_id)
                .cloned()
                .collect(),
            None => inner.messages.clone(),
        };
        drop(inner);

        messages.sort_by(|a, b| {
            let ordering = match query.order_by {
                OrderBy::Timestamp => a.timestamp.cmp(&b.timestamp),
                OrderBy::Id => a.id.cmp(&b.id),
                OrderBy::Text => a.text.cmp(&b.text),
                OrderBy::UserId => a.user_id.cmp(&b.user_id),
            };
            match query.order {
                Order::Asc => ordering,
                Order::Desc => ordering.reverse(),
            }
        });

        if let Some(limit) = query.limit
            && limit > 0
        {
            messages.truncate(limit as usize);
        }
        messages
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
