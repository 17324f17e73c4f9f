//! Discord REST calls: identity, channel lookups, history, and replies.

use super::types::{
    AllowedMentions, ChannelInfo, CreateMessage, DcChannel, DcMessage, DcUser, MessageReference,
};
use relay_core::{error::RelayError, message::HistoryMessage};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Thin REST client shared by the channel and its gateway task.
#[derive(Clone)]
pub(crate) struct Rest {
    client: reqwest::Client,
    api_base: String,
    auth: String,
    /// Channel type lookups, cached for the process lifetime.
    channel_cache: Arc<Mutex<HashMap<String, ChannelInfo>>>,
}

impl Rest {
    pub(crate) fn new(client: reqwest::Client, api_base: &str, token: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth: format!("Bot {token}"),
            channel_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// GET a JSON resource. `Ok(None)` on 404.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, RelayError> {
        let url = format!("{}{path}", self.api_base);
        debug!("discord: GET {url}");
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth)
            .send()
            .await
            .map_err(|e| RelayError::Gateway(format!("discord GET {path} failed: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::Gateway(format!(
                "discord GET {path} returned {status}: {text}"
            )));
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| RelayError::Gateway(format!("discord GET {path} parse failed: {e}")))
    }

    /// The bot user behind the token.
    pub(crate) async fn current_user(&self) -> Result<DcUser, RelayError> {
        self.get("/users/@me")
            .await?
            .ok_or_else(|| RelayError::Gateway("discord: /users/@me not found".into()))
    }

    /// Channel type and parent, from cache when possible.
    pub(crate) async fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo, RelayError> {
        if let Some(info) = self.channel_cache.lock().await.get(channel_id) {
            return Ok(info.clone());
        }

        let channel: DcChannel = self
            .get(&format!("/channels/{channel_id}"))
            .await?
            .ok_or_else(|| RelayError::Gateway(format!("discord channel {channel_id} not found")))?;
        let info = ChannelInfo::from(channel);

        self.channel_cache
            .lock()
            .await
            .insert(channel_id.to_string(), info.clone());
        Ok(info)
    }

    /// A single message, or `None` if it no longer exists.
    pub(crate) async fn message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<HistoryMessage>, RelayError> {
        let msg: Option<DcMessage> = self
            .get(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await?;
        Ok(msg.map(history_message))
    }

    /// Up to `limit` recent messages, newest first.
    pub(crate) async fn messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<HistoryMessage>, RelayError> {
        let limit = limit.clamp(1, 100);
        let msgs: Vec<DcMessage> = self
            .get(&format!("/channels/{channel_id}/messages?limit={limit}"))
            .await?
            .unwrap_or_default();
        Ok(msgs.into_iter().map(history_message).collect())
    }

    /// Post `text` to a channel, optionally as a reply to `reply_to`.
    pub(crate) async fn create_message(
        &self,
        channel_id: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<(), RelayError> {
        let url = format!("{}/channels/{channel_id}/messages", self.api_base);
        let body = CreateMessage {
            content: text,
            message_reference: reply_to.map(|message_id| MessageReference {
                message_id,
                fail_if_not_exists: false,
            }),
            allowed_mentions: AllowedMentions {
                parse: Vec::new(),
                replied_user: true,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Gateway(format!("discord send failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::Gateway(format!(
                "discord send returned {status}: {text}"
            )));
        }
        Ok(())
    }
}

pub(crate) fn history_message(msg: DcMessage) -> HistoryMessage {
    HistoryMessage {
        id: msg.id,
        author_id: msg.author.id,
        content: msg.content,
    }
}
