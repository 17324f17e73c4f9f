use super::*;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn complete_config() -> Config {
    let mut cfg = Config::default();
    cfg.apply_env_from(env(&[
        ("ASSISTANT_ID", "asst_123"),
        ("OPENAI_API_KEY", "sk-test"),
        ("DISCORD_TOKEN", "discord-token"),
    ]));
    cfg
}

#[test]
fn test_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.relay.max_reply_chars, 1999);
    assert_eq!(
        cfg.relay.fallback_message,
        "Sorry, I encountered an error processing your message."
    );
    assert_eq!(cfg.assistant.poll_interval_ms, 1000);
    assert_eq!(cfg.assistant.base_url, "https://api.openai.com/v1");
    assert_eq!(cfg.memory.backend, MemoryBackend::Memory);
    assert_eq!(cfg.backfill.mode, BackfillMode::Concurrent);
    assert!(cfg.channel.discord.is_none());
}

#[test]
fn test_parse_full_toml() {
    let cfg = parse(
        r#"
        [relay]
        log_level = "debug"
        max_reply_chars = 500

        [assistant]
        assistant_id = "asst_file"
        api_key = "sk-file"
        poll_interval_ms = 250
        run_timeout_secs = 30

        [channel.discord]
        bot_token = "tok"
        history_limit = 100

        [memory]
        backend = "sqlite"
        db_path = "/tmp/relay.db"

        [backfill]
        mode = "sequential"
        "#,
    )
    .unwrap();

    assert_eq!(cfg.relay.log_level, "debug");
    assert_eq!(cfg.relay.max_reply_chars, 500);
    assert_eq!(cfg.assistant.assistant_id, "asst_file");
    assert_eq!(cfg.assistant.poll_interval_ms, 250);
    assert_eq!(cfg.assistant.run_timeout_secs, 30);
    let dc = cfg.channel.discord.as_ref().unwrap();
    assert!(dc.enabled);
    assert_eq!(dc.history_limit, 100);
    assert_eq!(cfg.memory.backend, MemoryBackend::Sqlite);
    assert_eq!(cfg.backfill.mode, BackfillMode::Sequential);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_parse_rejects_unknown_backend() {
    let err = parse("[memory]\nbackend = \"redis\"\n").unwrap_err();
    assert!(matches!(err, RelayError::Config(_)));
}

#[test]
fn test_env_overrides_file_values() {
    let mut cfg = parse(
        r#"
        [assistant]
        assistant_id = "asst_file"
        "#,
    )
    .unwrap();
    cfg.apply_env_from(env(&[("ASSISTANT_ID", "asst_env"), ("OPENAI_API_KEY", "")]));
    assert_eq!(cfg.assistant.assistant_id, "asst_env");
    assert!(cfg.assistant.api_key.is_empty(), "empty env values are ignored");
}

#[test]
fn test_env_token_creates_discord_section() {
    let cfg = complete_config();
    let dc = cfg.channel.discord.as_ref().unwrap();
    assert!(dc.enabled);
    assert_eq!(dc.bot_token, "discord-token");
    assert_eq!(dc.request_timeout_secs, 60);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_validate_requires_assistant_id() {
    let mut cfg = complete_config();
    cfg.assistant.assistant_id.clear();
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("ASSISTANT_ID"), "{err}");
}

#[test]
fn test_validate_requires_discord_token() {
    let mut cfg = complete_config();
    cfg.channel.discord = None;
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("DISCORD_TOKEN"), "{err}");
}

#[test]
fn test_validate_requires_api_key() {
    let mut cfg = complete_config();
    cfg.assistant.api_key = "  ".into();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_poll_interval() {
    let mut cfg = complete_config();
    cfg.assistant.poll_interval_ms = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_validate_bounds_reply_length() {
    for bad in [0, 2000, 5000] {
        let mut cfg = complete_config();
        cfg.relay.max_reply_chars = bad;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("max_reply_chars"), "{bad}: {err}");
    }
    for ok in [1, 1999] {
        let mut cfg = complete_config();
        cfg.relay.max_reply_chars = ok;
        assert!(cfg.validate().is_ok(), "{ok} should be accepted");
    }
}

#[test]
fn test_validate_rejects_blank_fallback() {
    let mut cfg = complete_config();
    cfg.relay.fallback_message = "   ".into();
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("fallback_message"), "{err}");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__relay_config__.toml").unwrap();
    assert_eq!(cfg.relay.name, "Relay");
}
