use super::gateway::{handle_dispatch, heartbeat_payload, identify_payload, to_incoming, SessionContext};
use super::rest::history_message;
use super::types::*;
use super::DiscordChannel;
use relay_core::{config::DiscordConfig, traits::Channel};
use std::sync::{Arc, RwLock};

const MESSAGE_CREATE: &str = r#"{
    "id": "1100",
    "channel_id": "900",
    "guild_id": "1",
    "author": {"id": "42", "username": "alice", "discriminator": "0"},
    "content": "<@77> what's the plan?",
    "mentions": [{"id": "77", "username": "relay", "bot": true}],
    "timestamp": "2024-05-01T10:00:00.000000+00:00",
    "type": 0
}"#;

#[test]
fn test_message_create_to_incoming() {
    let msg: DcMessage = serde_json::from_str(MESSAGE_CREATE).unwrap();
    let incoming = to_incoming(msg);
    assert_eq!(incoming.channel, "discord");
    assert_eq!(incoming.channel_id, "900");
    assert_eq!(incoming.message_id, "1100");
    assert_eq!(incoming.sender_id, "42");
    assert_eq!(incoming.sender_name.as_deref(), Some("alice"));
    assert!(!incoming.author_is_bot);
    assert!(incoming.mentions_user("77"));
    assert!(!incoming.mentions_user("42"));
    assert_eq!(incoming.text, "<@77> what's the plan?");
}

#[test]
fn test_bot_author_flag() {
    let json = r#"{"id":"1","channel_id":"2","author":{"id":"3","username":"b","bot":true},
        "content":"beep"}"#;
    let msg: DcMessage = serde_json::from_str(json).unwrap();
    let incoming = to_incoming(msg);
    assert!(incoming.author_is_bot);
    assert!(incoming.mentions.is_empty());
}

#[test]
fn test_channel_info_thread_types() {
    for (kind, expected) in [(0u8, false), (5, false), (10, true), (11, true), (12, true), (15, false)] {
        let channel = DcChannel {
            id: "1".into(),
            kind,
            parent_id: Some("2".into()),
        };
        assert_eq!(ChannelInfo::from(channel).is_thread, expected, "type {kind}");
    }
}

#[test]
fn test_channel_parsing() {
    let json = r#"{"id":"900","type":11,"guild_id":"1","parent_id":"800","name":"planning"}"#;
    let info = ChannelInfo::from(serde_json::from_str::<DcChannel>(json).unwrap());
    assert_eq!(
        info,
        ChannelInfo {
            is_thread: true,
            parent_id: Some("800".into()),
        }
    );
}

#[test]
fn test_history_message_conversion() {
    let msg: DcMessage = serde_json::from_str(MESSAGE_CREATE).unwrap();
    let history = history_message(msg);
    assert_eq!(history.id, "1100");
    assert_eq!(history.author_id, "42");
    assert_eq!(history.content, "<@77> what's the plan?");
}

#[test]
fn test_gateway_payload_parsing() {
    let hello: GatewayPayload =
        serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
            .unwrap();
    assert_eq!(hello.op, OP_HELLO);
    let hello: Hello = serde_json::from_value(hello.d).unwrap();
    assert_eq!(hello.heartbeat_interval, 41250);

    let ack: GatewayPayload = serde_json::from_str(r#"{"op":11}"#).unwrap();
    assert_eq!(ack.op, OP_HEARTBEAT_ACK);
    assert!(ack.t.is_none());
}

#[test]
fn test_identify_payload() {
    let payload = identify_payload("secret");
    assert_eq!(payload["op"], 2);
    assert_eq!(payload["d"]["token"], "secret");
    assert_eq!(payload["d"]["intents"], 33281);
}

#[test]
fn test_heartbeat_payload() {
    assert_eq!(heartbeat_payload(None), serde_json::json!({"op": 1, "d": null}));
    assert_eq!(heartbeat_payload(Some(7)), serde_json::json!({"op": 1, "d": 7}));
}

#[test]
fn test_reply_body() {
    let body = CreateMessage {
        content: "hi",
        message_reference: Some(MessageReference {
            message_id: "1100",
            fail_if_not_exists: false,
        }),
        allowed_mentions: AllowedMentions {
            parse: Vec::new(),
            replied_user: true,
        },
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["content"], "hi");
    assert_eq!(value["message_reference"]["message_id"], "1100");
    assert_eq!(value["allowed_mentions"]["replied_user"], true);
}

#[test]
fn test_self_id_unknown_before_start() {
    let channel = DiscordChannel::new(DiscordConfig::default()).unwrap();
    assert_eq!(channel.name(), "discord");
    assert!(channel.self_id().is_none());
}

fn session_context() -> SessionContext {
    SessionContext {
        gateway_url: "wss://gateway.invalid".into(),
        token: "tok".into(),
        self_id: Arc::new(RwLock::new(None)),
    }
}

#[test]
fn test_message_create_forwarded_without_channel_lookup() {
    let ctx = session_context();
    let payload = GatewayPayload {
        op: OP_DISPATCH,
        d: serde_json::from_str(MESSAGE_CREATE).unwrap(),
        s: Some(3),
        t: Some("MESSAGE_CREATE".into()),
    };
    let incoming = handle_dispatch(&ctx, payload).expect("message forwarded");
    assert_eq!(incoming.channel_id, "900");
    assert!(incoming.mentions_user("77"));
}

#[test]
fn test_ready_sets_self_id() {
    let ctx = session_context();
    let payload = GatewayPayload {
        op: OP_DISPATCH,
        d: serde_json::json!({"v": 10, "user": {"id": "77", "username": "relay", "bot": true}}),
        s: Some(1),
        t: Some("READY".into()),
    };
    assert!(handle_dispatch(&ctx, payload).is_none());
    assert_eq!(ctx.self_id.read().unwrap().as_deref(), Some("77"));
}

#[test]
fn test_unreadable_message_dropped() {
    let ctx = session_context();
    let payload = GatewayPayload {
        op: OP_DISPATCH,
        d: serde_json::json!({"id": "1"}),
        s: None,
        t: Some("MESSAGE_CREATE".into()),
    };
    assert!(handle_dispatch(&ctx, payload).is_none());
}
