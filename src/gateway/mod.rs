//! Gateway: the event loop connecting chat channels to the assistant service.
//!
//! Includes: channel fan-in, per-event task dispatch, the turn pipeline,
//! and graceful shutdown.

mod backfill;
mod pipeline;
pub mod run;
pub mod session;


use relay_core::{
    config::{AssistantConfig, BackfillMode, RelayConfig},
    error::RelayError,
    message::{IncomingMessage, OutgoingMessage},
    mention::truncate_chars,
    traits::{AssistantService, Channel},
};
use run::RunDriver;
use session::SessionDirectory;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// The central gateway that relays turns between channels and the assistant.
pub struct Gateway {
    pub(super) assistant: Arc<dyn AssistantService>,
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) sessions: SessionDirectory,
    pub(super) driver: RunDriver,
    pub(super) assistant_id: String,
    pub(super) backfill_mode: BackfillMode,
    pub(super) relay_config: RelayConfig,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        assistant: Arc<dyn AssistantService>,
        channels: HashMap<String, Arc<dyn Channel>>,
        sessions: SessionDirectory,
        assistant_config: &AssistantConfig,
        backfill_mode: BackfillMode,
        relay_config: RelayConfig,
    ) -> Self {
        Self {
            assistant,
            channels,
            sessions,
            driver: RunDriver::from_config(assistant_config),
            assistant_id: assistant_config.assistant_id.clone(),
            backfill_mode,
            relay_config,
        }
    }

    /// Run the main event loop until every channel stops or Ctrl-C.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Relay gateway running | assistant: {} ({}) | channels: {} | sessions: {} | backfill: {:?}",
            self.assistant.name(),
            self.assistant_id,
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.sessions.backend(),
            self.backfill_mode,
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    let Some(incoming) = maybe else {
                        info!("All channels closed");
                        break;
                    };
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// One-shot turn on a fresh remote thread, outside any chat channel.
    pub async fn ask(&self, prompt: &str) -> Result<String, RelayError> {
        let thread_id = self.assistant.create_thread().await?;
        run::submit_turn(self.assistant.as_ref(), &thread_id, prompt).await?;
        run::complete_turn(
            self.assistant.as_ref(),
            &self.driver,
            &thread_id,
            &self.assistant_id,
        )
        .await
    }

    async fn shutdown(&self) {
        info!("Shutting down...");
        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }
        info!("Shutdown complete.");
    }

    /// Reply to `incoming` on its originating channel, cut to the outbound limit.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage {
            text: truncate_chars(text, self.relay_config.max_reply_chars),
            reply_target: Some(incoming.channel_id.clone()),
            reply_to: Some(incoming.message_id.clone()),
        };

        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send reply to {}: {e}", incoming.channel_id);
            }
        }
    }
}
