//! Gateway websocket session and Channel trait implementation.

use super::types::{
    DcMessage, GatewayPayload, Hello, Ready, INTENTS, OP_DISPATCH, OP_HEARTBEAT,
    OP_HEARTBEAT_ACK, OP_HELLO, OP_IDENTIFY, OP_INVALID_SESSION, OP_RECONNECT,
};
use super::DiscordChannel;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use relay_core::{
    error::RelayError,
    message::{HistoryMessage, IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a gateway session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Discord asked us to reconnect, or the socket closed.
    Reconnect,
    /// Nobody is listening anymore.
    ReceiverDropped,
}

/// Everything a gateway session needs, cloned into the background task.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub gateway_url: String,
    pub token: String,
    pub self_id: Arc<RwLock<Option<String>>>,
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, RelayError> {
        let me = self.rest.current_user().await?;
        info!("Discord channel starting as {} ({})", me.username, me.id);
        set_self_id(&self.self_id, me.id);

        let (tx, rx) = mpsc::channel(64);
        let ctx = SessionContext {
            gateway_url: self.gateway_url.clone(),
            token: self.config.bot_token.clone(),
            self_id: self.self_id.clone(),
        };

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                match run_session(&ctx, &tx).await {
                    Ok(SessionEnd::ReceiverDropped) => {
                        info!("discord channel receiver dropped, stopping gateway");
                        return;
                    }
                    Ok(SessionEnd::Reconnect) => {
                        info!("discord: gateway session ended, reconnecting");
                        backoff_secs = 1;
                    }
                    Err(e) => {
                        error!("discord gateway error (retry in {backoff_secs}s): {e}");
                    }
                }
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                backoff_secs = (backoff_secs * 2).min(60);
            }
        });

        Ok(rx)
    }

    fn self_id(&self) -> Option<String> {
        self.self_id.read().ok().and_then(|id| id.clone())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        let channel_id = message
            .reply_target
            .as_deref()
            .ok_or_else(|| RelayError::Gateway("no reply_target on outgoing message".into()))?;

        self.rest
            .create_message(channel_id, &message.text, message.reply_to.as_deref())
            .await
    }

    async fn is_thread(&self, channel_id: &str) -> Result<bool, RelayError> {
        Ok(self.rest.channel_info(channel_id).await?.is_thread)
    }

    async fn fetch_starter_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<HistoryMessage>, RelayError> {
        let info = self.rest.channel_info(thread_id).await?;
        if !info.is_thread {
            return Ok(None);
        }

        // Threads started from a message share that message's id and live
        // under the parent channel; forum posts keep it inside the thread.
        if let Some(parent) = info.parent_id.as_deref() {
            if let Some(starter) = self.rest.message(parent, thread_id).await? {
                return Ok(Some(starter));
            }
        }
        self.rest.message(thread_id, thread_id).await
    }

    async fn fetch_messages(&self, channel_id: &str) -> Result<Vec<HistoryMessage>, RelayError> {
        self.rest
            .messages(channel_id, self.config.history_limit)
            .await
    }

    async fn stop(&self) -> Result<(), RelayError> {
        info!("Discord channel stopped");
        Ok(())
    }
}

fn set_self_id(slot: &RwLock<Option<String>>, id: String) {
    match slot.write() {
        Ok(mut guard) => *guard = Some(id),
        Err(e) => warn!("discord: self id lock poisoned: {e}"),
    }
}

/// Run one gateway connection until it ends.
async fn run_session(
    ctx: &SessionContext,
    tx: &mpsc::Sender<IncomingMessage>,
) -> Result<SessionEnd, RelayError> {
    let (stream, _response) = connect_async(ctx.gateway_url.as_str())
        .await
        .map_err(|e| RelayError::Gateway(format!("discord gateway connect failed: {e}")))?;
    let (mut sink, mut source) = stream.split();

    let hello = loop {
        let Some(frame) = source.next().await else {
            return Ok(SessionEnd::Reconnect);
        };
        let frame =
            frame.map_err(|e| RelayError::Gateway(format!("discord gateway read failed: {e}")))?;
        if let Some(payload) = parse_frame(frame)? {
            if payload.op == OP_HELLO {
                break serde_json::from_value::<Hello>(payload.d)?;
            }
        }
    };
    debug!(
        "discord: hello, heartbeat every {}ms",
        hello.heartbeat_interval
    );

    sink.send(WsMessage::Text(identify_payload(&ctx.token).to_string()))
        .await
        .map_err(|e| RelayError::Gateway(format!("discord identify failed: {e}")))?;

    let mut heartbeat = tokio::time::interval(Duration::from_millis(hello.heartbeat_interval));
    // The first tick fires immediately; the first heartbeat is due one interval in.
    heartbeat.tick().await;
    let mut seq: Option<u64> = None;
    let mut awaiting_ack = false;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if awaiting_ack {
                    warn!("discord: heartbeat not acknowledged, reconnecting");
                    return Ok(SessionEnd::Reconnect);
                }
                sink.send(WsMessage::Text(heartbeat_payload(seq).to_string()))
                    .await
                    .map_err(|e| RelayError::Gateway(format!("discord heartbeat failed: {e}")))?;
                awaiting_ack = true;
            }
            frame = source.next() => {
                let Some(frame) = frame else {
                    return Ok(SessionEnd::Reconnect);
                };
                let frame = frame
                    .map_err(|e| RelayError::Gateway(format!("discord gateway read failed: {e}")))?;
                if matches!(frame, WsMessage::Close(_)) {
                    return Ok(SessionEnd::Reconnect);
                }
                let Some(payload) = parse_frame(frame)? else {
                    continue;
                };
                if payload.s.is_some() {
                    seq = payload.s;
                }

                match payload.op {
                    OP_HEARTBEAT_ACK => awaiting_ack = false,
                    OP_HEARTBEAT => {
                        sink.send(WsMessage::Text(heartbeat_payload(seq).to_string()))
                            .await
                            .map_err(|e| RelayError::Gateway(format!("discord heartbeat failed: {e}")))?;
                    }
                    OP_RECONNECT | OP_INVALID_SESSION => {
                        info!("discord: gateway requested reconnect (op {})", payload.op);
                        return Ok(SessionEnd::Reconnect);
                    }
                    OP_DISPATCH => {
                        if let Some(incoming) = handle_dispatch(ctx, payload) {
                            if tx.send(incoming).await.is_err() {
                                return Ok(SessionEnd::ReceiverDropped);
                            }
                        }
                    }
                    other => debug!("discord: ignoring op {other}"),
                }
            }
        }
    }
}

/// Decode a text frame into a gateway payload. Non-text frames yield `None`.
fn parse_frame(frame: WsMessage) -> Result<Option<GatewayPayload>, RelayError> {
    match frame {
        WsMessage::Text(text) => Ok(Some(serde_json::from_str(&text)?)),
        _ => Ok(None),
    }
}

/// Handle a dispatch event, returning an incoming message for MESSAGE_CREATE.
pub(crate) fn handle_dispatch(
    ctx: &SessionContext,
    payload: GatewayPayload,
) -> Option<IncomingMessage> {
    match payload.t.as_deref() {
        Some("READY") => {
            match serde_json::from_value::<Ready>(payload.d) {
                Ok(ready) => {
                    info!("discord: ready as {}", ready.user.username);
                    set_self_id(&ctx.self_id, ready.user.id);
                }
                Err(e) => warn!("discord: unreadable READY payload: {e}"),
            }
            None
        }
        Some("MESSAGE_CREATE") => match serde_json::from_value::<DcMessage>(payload.d) {
            Ok(msg) => Some(to_incoming(msg)),
            Err(e) => {
                warn!("discord: unreadable MESSAGE_CREATE payload: {e}");
                None
            }
        },
        _ => None,
    }
}

pub(crate) fn identify_payload(token: &str) -> serde_json::Value {
    serde_json::json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "relay",
                "device": "relay",
            },
        },
    })
}

pub(crate) fn heartbeat_payload(seq: Option<u64>) -> serde_json::Value {
    serde_json::json!({ "op": OP_HEARTBEAT, "d": seq })
}

pub(crate) fn to_incoming(msg: DcMessage) -> IncomingMessage {
    IncomingMessage {
        id: Uuid::new_v4(),
        channel: "discord".to_string(),
        channel_id: msg.channel_id,
        message_id: msg.id,
        sender_id: msg.author.id,
        sender_name: Some(msg.author.username),
        author_is_bot: msg.author.bot,
        text: msg.content,
        mentions: msg.mentions.into_iter().map(|u| u.id).collect(),
        timestamp: chrono::Utc::now(),
    }
}
