mod assistant;
mod channels;
mod defaults;

#[cfg(test)]
mod tests;

pub use assistant::*;
pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RelayError;
use defaults::*;

/// Top-level Relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
}

/// General relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files. Unset = stdout only.
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Reply sent to the user whenever a turn fails.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    /// Outbound replies are cut to this many characters.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_dir: None,
            fallback_message: default_fallback_message(),
            max_reply_chars: default_max_reply_chars(),
        }
    }
}

/// Where the channel → thread mapping lives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// Process-local map, lost on restart.
    #[default]
    Memory,
    /// SQLite file at `db_path`.
    Sqlite,
}

impl MemoryBackend {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub backend: MemoryBackend,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::default(),
            db_path: default_db_path(),
        }
    }
}

/// How replayed history is dispatched to a new remote thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackfillMode {
    /// All turns in flight at once; the service may store them out of order.
    #[default]
    Concurrent,
    /// One turn at a time, oldest first; order is preserved.
    Sequential,
}

/// Backfill config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackfillConfig {
    #[serde(default)]
    pub mode: BackfillMode,
}

impl Config {
    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using `lookup` to resolve variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ASSISTANT_ID") {
            self.assistant.assistant_id = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.assistant.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.assistant.base_url = v;
        }
        if let Some(v) = get("DISCORD_TOKEN") {
            self.channel
                .discord
                .get_or_insert_with(DiscordConfig::default)
                .bot_token = v;
        }
    }

    /// Check the identifiers Relay cannot start without.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.assistant.assistant_id.trim().is_empty() {
            return Err(RelayError::Config(
                "assistant id is missing. Set ASSISTANT_ID or [assistant].assistant_id.".into(),
            ));
        }
        if self.assistant.api_key.trim().is_empty() {
            return Err(RelayError::Config(
                "OpenAI API key is missing. Set OPENAI_API_KEY or [assistant].api_key.".into(),
            ));
        }
        match &self.channel.discord {
            Some(dc) if dc.enabled && !dc.bot_token.trim().is_empty() => {}
            Some(dc) if !dc.enabled => {
                return Err(RelayError::Config(
                    "Discord is disabled; no channel left to relay.".into(),
                ));
            }
            _ => {
                return Err(RelayError::Config(
                    "Discord token is missing. Set DISCORD_TOKEN or [channel.discord].bot_token."
                        .into(),
                ));
            }
        }
        if !(1..=REPLY_CHAR_LIMIT).contains(&self.relay.max_reply_chars) {
            return Err(RelayError::Config(format!(
                "[relay].max_reply_chars must be between 1 and {REPLY_CHAR_LIMIT}, got {}.",
                self.relay.max_reply_chars
            )));
        }
        if self.relay.fallback_message.trim().is_empty() {
            return Err(RelayError::Config(
                "[relay].fallback_message must not be blank.".into(),
            ));
        }
        if self.assistant.poll_interval_ms == 0 {
            return Err(RelayError::Config(
                "[assistant].poll_interval_ms must be greater than zero.".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment overrides
/// are not applied here; see [`Config::apply_env`].
pub fn load(path: &str) -> Result<Config, RelayError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    parse(&content)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, RelayError> {
    toml::from_str(content).map_err(|e| RelayError::Config(format!("failed to parse config: {e}")))
}
