use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming chat event from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "discord").
    pub channel: String,
    /// Platform-specific conversation id (Discord channel or thread id).
    pub channel_id: String,
    /// Platform-specific id of this message, used to thread the reply.
    pub message_id: String,
    /// Platform-specific author id.
    pub sender_id: String,
    /// Human-readable author name.
    pub sender_name: Option<String>,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub author_is_bot: bool,
    /// Raw message text, mention markup included.
    pub text: String,
    /// User ids mentioned in the message.
    #[serde(default)]
    pub mentions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    /// Whether `user_id` is among the message's mentions.
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|m| m == user_id)
    }
}

/// An outgoing reply to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific conversation id to deliver to.
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Platform-specific message id this replies to.
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// A message already present in a channel, as returned by a history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub author_id: String,
    pub content: String,
}
