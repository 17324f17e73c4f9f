//! Discord bot channel.
//!
//! Inbound messages arrive over the gateway websocket; history fetches and
//! replies go through the REST API.
//! Docs: <https://discord.com/developers/docs/reference>

mod gateway;
pub(crate) mod rest;
pub(crate) mod types;

#[cfg(test)]
mod tests;

use relay_core::{config::DiscordConfig, error::RelayError};
use rest::Rest;
use std::sync::{Arc, RwLock};
use std::time::Duration;

const API_BASE: &str = "https://discord.com/api/v10";
const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Discord channel using the gateway websocket and REST API.
pub struct DiscordChannel {
    config: DiscordConfig,
    rest: Rest,
    gateway_url: String,
    /// The bot's own user id, set at start and refreshed on READY.
    self_id: Arc<RwLock<Option<String>>>,
}

impl DiscordChannel {
    /// Create a new Discord channel from config.
    pub fn new(config: DiscordConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::Gateway(format!("discord: failed to build client: {e}")))?;
        let rest = Rest::new(client, API_BASE, &config.bot_token);
        Ok(Self {
            config,
            rest,
            gateway_url: GATEWAY_URL.to_string(),
            self_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Check that the token is accepted, returning the bot's user name.
    pub async fn check_token(&self) -> Result<String, RelayError> {
        self.rest.current_user().await.map(|u| u.username)
    }
}
