//! Discord API deserialization types (REST and gateway).

use serde::{Deserialize, Serialize};

// --- Gateway opcodes ---

pub(crate) const OP_DISPATCH: u8 = 0;
pub(crate) const OP_HEARTBEAT: u8 = 1;
pub(crate) const OP_IDENTIFY: u8 = 2;
pub(crate) const OP_RECONNECT: u8 = 7;
pub(crate) const OP_INVALID_SESSION: u8 = 9;
pub(crate) const OP_HELLO: u8 = 10;
pub(crate) const OP_HEARTBEAT_ACK: u8 = 11;

/// GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT.
pub(crate) const INTENTS: u64 = (1 << 0) | (1 << 9) | (1 << 15);

/// Channel types that are threads: announcement, public, and private threads.
const THREAD_CHANNEL_TYPES: [u8; 3] = [10, 11, 12];

/// A gateway frame in either direction.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: serde_json::Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ready {
    pub user: DcUser,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DcUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DcMessage {
    pub id: String,
    pub channel_id: String,
    pub author: DcUser,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<DcUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DcChannel {
    #[allow(dead_code)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// What we remember about a channel between events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChannelInfo {
    pub is_thread: bool,
    pub parent_id: Option<String>,
}

impl From<DcChannel> for ChannelInfo {
    fn from(channel: DcChannel) -> Self {
        Self {
            is_thread: THREAD_CHANNEL_TYPES.contains(&channel.kind),
            parent_id: channel.parent_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessage<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference<'a>>,
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageReference<'a> {
    pub message_id: &'a str,
    pub fail_if_not_exists: bool,
}

/// Replies ping the original author only; text in the reply never mentions anyone.
#[derive(Debug, Serialize)]
pub(crate) struct AllowedMentions {
    pub parse: Vec<String>,
    pub replied_user: bool,
}
