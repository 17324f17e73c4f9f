use super::defaults::*;
use serde::{Deserialize, Serialize};

/// Assistant service config (OpenAI Assistants API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// API key. `OPENAI_API_KEY` overrides it.
    #[serde(default)]
    pub api_key: String,
    /// `OPENAI_BASE_URL` overrides it.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Assistant that every run is started with. `ASSISTANT_ID` overrides it.
    #[serde(default)]
    pub assistant_id: String,
    /// Wait between run status checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on a run that is still pending after this long.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            assistant_id: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            run_timeout_secs: default_run_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
