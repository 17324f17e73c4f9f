use thiserror::Error;

/// Top-level error type for Relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Error from the assistant service (network, rejection, malformed body).
    #[error("assistant error: {0}")]
    Assistant(String),

    /// Error from the chat gateway, including history fetches during backfill.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// A finished run left nothing we could read back as a reply.
    #[error("malformed reply: {0}")]
    MalformedReply(String),

    /// A run did not reach a terminal status within the polling budget.
    #[error("run {run_id} on thread {thread_id} still pending after {waited_secs}s")]
    RunTimeout {
        thread_id: String,
        run_id: String,
        waited_secs: u64,
    },

    /// A run reached a terminal status other than `completed`.
    #[error("run ended with status {0}")]
    RunNotCompleted(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Session storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
