//! OpenAI Assistants API (v2) client.
//!
//! Threads, messages, and runs are created through the REST endpoints under
//! `/threads`. Every request carries the `OpenAI-Beta: assistants=v2` header.
//! Docs: <https://platform.openai.com/docs/api-reference/assistants>

use async_trait::async_trait;
use relay_core::{
    assistant::{ContentBlock, Run, RunStatus, ThreadMessage, Turn},
    config::AssistantConfig,
    error::RelayError,
    traits::AssistantService,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Assistants API client.
pub struct OpenAiAssistants {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiAssistants {
    /// Create from config values.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::Assistant(format!("openai: failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode a JSON body, mapping every failure to
    /// `RelayError::Assistant`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, RelayError> {
        let resp = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .send()
            .await
            .map_err(|e| RelayError::Assistant(format!("openai: {what} request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::Assistant(format!(
                "openai: {what} returned {status}: {text}"
            )));
        }

        resp.json().await.map_err(|e| {
            RelayError::Assistant(format!("openai: failed to parse {what} response: {e}"))
        })
    }
}

// --- Assistants API types ---

#[derive(Deserialize)]
pub(crate) struct ThreadObject {
    pub id: String,
}

#[derive(Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Deserialize)]
pub(crate) struct RunError {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct MessageList {
    pub data: Vec<MessageObject>,
}

#[derive(Deserialize)]
pub(crate) struct MessageObject {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

#[derive(Deserialize)]
pub(crate) struct MessageContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<MessageText>,
}

#[derive(Deserialize)]
pub(crate) struct MessageText {
    pub value: String,
}

impl From<RunObject> for Run {
    fn from(run: RunObject) -> Self {
        Run {
            id: run.id,
            thread_id: run.thread_id,
            status: run.status,
        }
    }
}

impl From<MessageObject> for ThreadMessage {
    fn from(msg: MessageObject) -> Self {
        let content = msg
            .content
            .into_iter()
            .map(|block| match (block.kind.as_str(), block.text) {
                ("text", Some(text)) => ContentBlock::Text(text.value),
                (_, _) => ContentBlock::Other(block.kind),
            })
            .collect();
        ThreadMessage {
            id: msg.id,
            role: msg.role,
            content,
        }
    }
}

#[async_trait]
impl AssistantService for OpenAiAssistants {
    fn name(&self) -> &str {
        "openai"
    }

    async fn create_thread(&self) -> Result<String, RelayError> {
        let url = self.url("threads");
        debug!("openai: POST {url}");
        let thread: ThreadObject = self
            .send(
                self.client.post(&url).json(&serde_json::json!({})),
                "create thread",
            )
            .await?;
        Ok(thread.id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<Turn, RelayError> {
        let url = self.url(&format!("threads/{thread_id}/messages"));
        debug!("openai: POST {url} ({} chars)", content.chars().count());
        let body = CreateMessageRequest { role, content };
        let msg: MessageObject = self
            .send(self.client.post(&url).json(&body), "create message")
            .await?;
        Ok(Turn {
            id: msg.id,
            role: msg.role,
            content: content.to_string(),
        })
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RelayError> {
        let url = self.url(&format!("threads/{thread_id}/runs"));
        debug!("openai: POST {url} assistant={assistant_id}");
        let body = CreateRunRequest { assistant_id };
        let run: RunObject = self
            .send(self.client.post(&url).json(&body), "create run")
            .await?;
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RelayError> {
        let url = self.url(&format!("threads/{thread_id}/runs/{run_id}"));
        let run: RunObject = self.send(self.client.get(&url), "retrieve run").await?;
        if let Some(err) = &run.last_error {
            warn!(
                "openai: run {} reported {}: {}",
                run.id,
                err.code.as_deref().unwrap_or("error"),
                err.message.as_deref().unwrap_or("")
            );
        }
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, RelayError> {
        let url = self.url(&format!("threads/{thread_id}/messages"));
        debug!("openai: GET {url}");
        let list: MessageList = self
            .send(
                self.client.get(&url).query(&[("order", "desc")]),
                "list messages",
            )
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        match self
            .client
            .get(self.url("models"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}
