//! Turn pipeline: the handle_message flow.

use super::backfill::backfill;
use super::run::{complete_turn, submit_turn};
use super::Gateway;
use relay_core::{
    error::RelayError, mention::strip_mentions, message::IncomingMessage, traits::Channel,
};
use tracing::{debug, error, info};

impl Gateway {
    /// Process a single incoming chat event through the full pipeline.
    ///
    /// Failures never escape: they are logged and answered with the fixed
    /// fallback reply.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let Some(channel) = self.channels.get(&incoming.channel).cloned() else {
            error!("message from unknown channel {}", incoming.channel);
            return;
        };

        if !should_handle(&incoming, channel.self_id().as_deref()) {
            return;
        }

        let text = strip_mentions(&incoming.text);
        if text.is_empty() {
            debug!("ignoring mention-only message in {}", incoming.channel_id);
            return;
        }

        let preview = if text.chars().count() > 60 {
            let truncated: String = text.chars().take(60).collect();
            format!("{truncated}...")
        } else {
            text.clone()
        };
        info!(
            "[{}:{}] {} says: {}",
            incoming.channel,
            incoming.channel_id,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            preview
        );

        let reply = match self.process_turn(channel.as_ref(), &incoming, &text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    "turn failed in {}:{}: {e}",
                    incoming.channel, incoming.channel_id
                );
                self.relay_config.fallback_message.clone()
            }
        };

        self.send_text(&incoming, &reply).await;
    }

    /// Resolve the session, submit the turn, run the assistant, read the reply.
    async fn process_turn(
        &self,
        channel: &dyn Channel,
        incoming: &IncomingMessage,
        text: &str,
    ) -> Result<String, RelayError> {
        let channel_id = incoming.channel_id.as_str();
        let _guard = self.sessions.lock(channel_id).await;

        let (thread_id, history_loaded) = match self.sessions.lookup(channel_id).await? {
            Some(thread_id) => (thread_id, false),
            None => {
                // Resolved before binding: a failed lookup must leave the
                // channel unbound so the next message retries the backfill.
                let is_thread = channel.is_thread(channel_id).await?;

                let thread_id = self.assistant.create_thread().await?;
                self.sessions.bind(channel_id, &thread_id).await?;
                info!("bound {channel_id} to new thread {thread_id}");

                let loaded = if is_thread {
                    backfill(
                        channel,
                        self.assistant.as_ref(),
                        channel_id,
                        &thread_id,
                        self.backfill_mode,
                    )
                    .await?
                } else {
                    false
                };
                (thread_id, loaded)
            }
        };

        if !history_loaded {
            submit_turn(self.assistant.as_ref(), &thread_id, text).await?;
        }

        complete_turn(
            self.assistant.as_ref(),
            &self.driver,
            &thread_id,
            &self.assistant_id,
        )
        .await
    }
}

/// Whether an event is addressed to us: a human author, some content, and
/// a mention of our own id.
pub(super) fn should_handle(incoming: &IncomingMessage, self_id: Option<&str>) -> bool {
    if incoming.author_is_bot || incoming.text.trim().is_empty() {
        return false;
    }
    match self_id {
        Some(id) => {
            let mentioned = incoming.mentions_user(id);
            if !mentioned {
                debug!("not mentioned in {}, ignoring", incoming.channel_id);
            }
            mentioned
        }
        None => {
            debug!("own id unknown yet, ignoring {}", incoming.channel_id);
            false
        }
    }
}
