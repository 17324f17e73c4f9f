//! History backfill: replay an existing chat thread into a new remote thread.

use super::run::submit_turn;
use futures_util::future::try_join_all;
use relay_core::{
    config::BackfillMode, error::RelayError, mention::strip_mentions, message::HistoryMessage,
    traits::AssistantService, traits::Channel,
};
use tracing::info;

/// Turn texts to replay, oldest first: the starter message, then the
/// fetched history (which arrives newest first). Mentions are stripped,
/// blank messages dropped, and a starter that also shows up in the history
/// is only replayed once.
pub fn history_turns(starter: Option<HistoryMessage>, recent: Vec<HistoryMessage>) -> Vec<String> {
    let starter_id = starter.as_ref().map(|m| m.id.clone());
    starter
        .into_iter()
        .chain(
            recent
                .into_iter()
                .rev()
                .filter(|m| Some(&m.id) != starter_id.as_ref()),
        )
        .map(|m| strip_mentions(&m.content))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Replay a thread's visible history into `thread_id`.
///
/// Returns `true` when at least one turn was submitted, in which case the
/// triggering message is already part of the replayed history.
pub async fn backfill(
    channel: &dyn Channel,
    service: &dyn AssistantService,
    chat_thread_id: &str,
    thread_id: &str,
    mode: BackfillMode,
) -> Result<bool, RelayError> {
    let starter = channel.fetch_starter_message(chat_thread_id).await?;
    let recent = channel.fetch_messages(chat_thread_id).await?;
    let turns = history_turns(starter, recent);

    if turns.is_empty() {
        return Ok(false);
    }

    match mode {
        BackfillMode::Concurrent => {
            try_join_all(turns.iter().map(|text| submit_turn(service, thread_id, text))).await?;
        }
        BackfillMode::Sequential => {
            for text in &turns {
                submit_turn(service, thread_id, text).await?;
            }
        }
    }

    info!(
        "backfilled {} messages from {chat_thread_id} into {thread_id}",
        turns.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, content: &str) -> HistoryMessage {
        HistoryMessage {
            id: id.into(),
            author_id: "u".into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_oldest_first_with_starter_leading() {
        let turns = history_turns(
            Some(msg("1", "S")),
            vec![msg("4", "C"), msg("3", "B"), msg("2", "A")],
        );
        assert_eq!(turns, vec!["S", "A", "B", "C"]);
    }

    #[test]
    fn test_strips_mentions_and_drops_blank() {
        let turns = history_turns(
            Some(msg("1", "<@77>")),
            vec![msg("3", "<@77> hi there"), msg("2", "   ")],
        );
        assert_eq!(turns, vec!["hi there"]);
    }

    #[test]
    fn test_starter_not_duplicated() {
        let turns = history_turns(Some(msg("1", "S")), vec![msg("2", "A"), msg("1", "S")]);
        assert_eq!(turns, vec!["S", "A"]);
    }

    #[test]
    fn test_no_starter() {
        let turns = history_turns(None, vec![msg("2", "B"), msg("1", "A")]);
        assert_eq!(turns, vec!["A", "B"]);
    }
}
