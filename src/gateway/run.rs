//! Turn submission, run polling, and reply extraction against a remote thread.

use relay_core::{
    assistant::{Run, RunStatus, Turn},
    config::AssistantConfig,
    error::RelayError,
    traits::AssistantService,
};
use std::time::Duration;
use tracing::{debug, info};

/// Append one user turn to a remote thread.
pub async fn submit_turn(
    service: &dyn AssistantService,
    thread_id: &str,
    text: &str,
) -> Result<Turn, RelayError> {
    service.create_message(thread_id, "user", text).await
}

/// Starts runs and polls them until they reach a terminal status.
#[derive(Debug, Clone)]
pub struct RunDriver {
    poll_interval: Duration,
    max_polls: u64,
}

impl RunDriver {
    /// Poll every `poll_interval`, giving up once `timeout` worth of polls is spent.
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        let interval_ms = poll_interval.as_millis().max(1);
        let max_polls = (timeout.as_millis() / interval_ms).max(1) as u64;
        Self {
            poll_interval,
            max_polls,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.run_timeout_secs),
        )
    }

    /// Create a run and wait for it.
    pub async fn drive(
        &self,
        service: &dyn AssistantService,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunStatus, RelayError> {
        let run = service.create_run(thread_id, assistant_id).await?;
        info!("run {} started on {thread_id} ({})", run.id, run.status);
        self.wait(service, &run).await
    }

    /// Poll `run` until its status is terminal and return that status.
    ///
    /// The status reported at creation is never trusted as final; the first
    /// poll happens immediately.
    pub async fn wait(
        &self,
        service: &dyn AssistantService,
        run: &Run,
    ) -> Result<RunStatus, RelayError> {
        for attempt in 1..=self.max_polls {
            let current = service.retrieve_run(&run.thread_id, &run.id).await?;
            if current.status.is_terminal() {
                info!("run {} finished: {} (polls: {attempt})", run.id, current.status);
                return Ok(current.status);
            }
            debug!("run {} is {}, waiting", run.id, current.status);
            if attempt < self.max_polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(RelayError::RunTimeout {
            thread_id: run.thread_id.clone(),
            run_id: run.id.clone(),
            waited_secs: (self.poll_interval.as_millis() as u64).saturating_mul(self.max_polls)
                / 1000,
        })
    }
}

/// Text of the most recent message in a thread.
pub async fn extract_reply(
    service: &dyn AssistantService,
    thread_id: &str,
) -> Result<String, RelayError> {
    let messages = service.list_messages(thread_id).await?;
    let latest = messages
        .first()
        .ok_or_else(|| RelayError::MalformedReply(format!("thread {thread_id} has no messages")))?;
    latest.primary_text().map(str::to_string).ok_or_else(|| {
        RelayError::MalformedReply(format!(
            "message {} in {thread_id} has no text content",
            latest.id
        ))
    })
}

/// Run the assistant on a thread that already holds the user's turn, and read the answer.
///
/// Only a `completed` run is read back. `cancelled`, `failed` and `expired`
/// stop here with [`RelayError::RunNotCompleted`] instead of going on to
/// extraction, because the newest message in the thread would then be the
/// user's own turn and would be echoed back as the reply.
pub async fn complete_turn(
    service: &dyn AssistantService,
    driver: &RunDriver,
    thread_id: &str,
    assistant_id: &str,
) -> Result<String, RelayError> {
    let status = driver.drive(service, thread_id, assistant_id).await?;
    if status != RunStatus::Completed {
        return Err(RelayError::RunNotCompleted(status.to_string()));
    }
    extract_reply(service, thread_id).await
}
