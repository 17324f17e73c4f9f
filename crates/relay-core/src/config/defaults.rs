/// Longest reply Relay will post; Discord rejects messages over 2000 characters.
pub(super) const REPLY_CHAR_LIMIT: usize = 1999;

// --- Default value functions ---

pub(super) fn default_name() -> String {
    "Relay".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_fallback_message() -> String {
    "Sorry, I encountered an error processing your message.".to_string()
}
pub(super) fn default_max_reply_chars() -> usize {
    REPLY_CHAR_LIMIT
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
pub(super) fn default_poll_interval_ms() -> u64 {
    1000
}
pub(super) fn default_run_timeout_secs() -> u64 {
    600
}
pub(super) fn default_request_timeout_secs() -> u64 {
    60
}
pub(super) fn default_history_limit() -> u8 {
    50
}
pub(super) fn default_db_path() -> String {
    "~/.relay/sessions.db".to_string()
}
