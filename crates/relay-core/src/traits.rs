use crate::{
    assistant::{Run, ThreadMessage, Turn},
    error::RelayError,
    message::{HistoryMessage, IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// Assistant service trait: the stateful brain.
///
/// Threads, messages, and runs live on the service. Relay only creates
/// them and observes their state.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Human-readable service name.
    fn name(&self) -> &str;

    /// Create an empty conversation thread and return its id.
    async fn create_thread(&self) -> Result<String, RelayError>;

    /// Append a message with the given role to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<Turn, RelayError>;

    /// Start a run of `assistant_id` against a thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RelayError>;

    /// Fetch the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RelayError>;

    /// List a thread's messages, most recent first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, RelayError>;

    /// Check if the service is reachable with the configured credentials.
    async fn is_available(&self) -> bool;
}

/// Messaging Channel trait: the chat side of the relay.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, RelayError>;

    /// The bot's own user id on this platform, once known.
    fn self_id(&self) -> Option<String>;

    /// Send a reply back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError>;

    /// Whether `channel_id` is a threaded sub-conversation.
    async fn is_thread(&self, channel_id: &str) -> Result<bool, RelayError>;

    /// Fetch the message a threaded sub-conversation was started from.
    ///
    /// `Ok(None)` when the thread has no starter (e.g. it was created empty).
    async fn fetch_starter_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<HistoryMessage>, RelayError>;

    /// Fetch a conversation's recent messages, most recent first.
    async fn fetch_messages(&self, channel_id: &str) -> Result<Vec<HistoryMessage>, RelayError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

/// Channel → remote thread mapping storage.
///
/// Implementations range from a volatile map to a database table; all share
/// the same lookup/bind contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend name for logs and `status`.
    fn name(&self) -> &str;

    /// Remote thread id bound to `channel_id`, if any.
    async fn lookup(&self, channel_id: &str) -> Result<Option<String>, RelayError>;

    /// Bind `channel_id` to `thread_id`, overwriting any previous binding.
    async fn bind(&self, channel_id: &str, thread_id: &str) -> Result<(), RelayError>;
}
