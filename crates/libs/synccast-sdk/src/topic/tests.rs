use super::*;
use crate::error::ErrorKind;
use crate::scope::InMemoryScopeRegistry;
use serde_json::json;

fn chat() -> Scope {
    Scope::with_channels("chat", ["message", "typing", "presence"])
}

fn builder() -> TopicBuilder {
    TopicBuilder::from_scope("test_app", chat())
}

#[test]
fn builds_canonical_topic() {
    let topic = builder()
        .channel("typing")
        .unwrap()
        .extra(["room42"])
        .for_user("99")
        .build()
        .unwrap();
    assert_eq!(topic, "test_app/chat/typing/room42/user/99");
}

#[test]
fn extras_keep_call_order_and_stringify() {
    let topic = builder()
        .channel("message")
        .unwrap()
        .for_user(42)
        .extra(["room"])
        .extra([5])
        .build()
        .unwrap();
    assert_eq!(topic, "test_app/chat/message/room/5/user/42");
}

#[test]
fn empty_app_id_falls_back() {
    let topic = TopicBuilder::from_scope("", chat()).channel("message").unwrap().build().unwrap();
    assert_eq!(topic, "default-app/chat/message");
}

#[test]
fn unknown_channel_lists_valid_channels() {
    let err = builder().channel("Typing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Topic);
    assert_eq!(err.detail("channel"), Some(&json!("Typing")));
    assert_eq!(err.detail("valid_channels"), Some(&json!(["message", "typing", "presence"])));
}

#[test]
fn build_without_channel_fails() {
    let err = builder().for_user("1").build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Topic);
    assert_eq!(err.detail("app_id"), Some(&json!("test_app")));
}

#[test]
fn build_is_idempotent() {
    let mut topic = builder();
    topic.channel("presence").unwrap().for_user("7");
    assert_eq!(topic.build().unwrap(), topic.build().unwrap());
}

#[test]
fn wildcard_renders_single_level_marker() {
    let topic = builder().channel("typing").unwrap().wildcard().build().unwrap();
    assert_eq!(topic, "test_app/chat/typing/user/+");
}

#[test]
fn last_user_selection_wins() {
    let mut topic = builder();
    topic.channel("typing").unwrap().for_user("5").wildcard();
    assert_eq!(topic.build().unwrap(), "test_app/chat/typing/user/+");

    topic.for_user("6");
    assert_eq!(topic.build().unwrap(), "test_app/chat/typing/user/6");
    let snapshot = topic.snapshot();
    assert!(snapshot.wildcard);
    assert_eq!(snapshot.user_id.as_deref(), Some("6"));
}

#[test]
fn full_wildcard_is_trailing_segment() {
    let topic = builder()
        .channel("message")
        .unwrap()
        .extra(["room", "5"])
        .wildcard()
        .full_wildcard()
        .build()
        .unwrap();
    assert_eq!(topic, "test_app/chat/message/room/5/user/+/#");

    let topic = builder().channel("message").unwrap().full_wildcard().build().unwrap();
    assert_eq!(topic, "test_app/chat/message/#");
}

#[test]
fn required_user_is_enforced() {
    let mut topic = builder();
    topic.require_user(true).channel("message").unwrap();
    let err = topic.build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Topic);
    assert_eq!(err.detail("channel"), Some(&json!("message")));

    assert_eq!(topic.wildcard().build().unwrap(), "test_app/chat/message/user/+");
}

#[test]
fn reset_clears_state_but_keeps_binding() {
    let mut topic = builder();
    topic.channel("message").unwrap().extra(["room"]).for_user("1").wildcard().full_wildcard();
    topic.reset();

    assert!(topic.build().is_err());
    let snapshot = topic.snapshot();
    assert_eq!(
        snapshot,
        TopicSnapshot {
            app_id: "test_app".into(),
            scope: "chat".into(),
            channel: None,
            extras: Vec::new(),
            user_id: None,
            wildcard: false,
            full_wildcard: false,
            topic: None,
        }
    );
}

#[test]
fn clone_is_independent() {
    let mut original = builder();
    original.channel("message").unwrap().extra(["room"]).for_user("1");
    let before = original.snapshot();

    let mut copy = original.clone();
    copy.channel("typing").unwrap().extra(["other"]).wildcard();

    assert_eq!(original.snapshot(), before);
    assert_eq!(copy.build().unwrap(), "test_app/chat/typing/room/other/user/+");
}

#[test]
fn snapshot_reports_built_topic() {
    let mut topic = builder();
    assert_eq!(topic.snapshot().topic, None);

    topic.channel("typing").unwrap().for_user("99");
    let value = serde_json::to_value(topic.snapshot()).unwrap();
    assert_eq!(
        value,
        json!({
            "app_id": "test_app",
            "scope": "chat",
            "channel": "typing",
            "extras": [],
            "user_id": "99",
            "wildcard": false,
            "full_wildcard": false,
            "topic": "test_app/chat/typing/user/99",
        })
    );
}

#[test]
fn resolves_scope_names_through_provider() {
    let registry = InMemoryScopeRegistry::new();
    registry.register(chat()).unwrap();

    let mut topic = TopicBuilder::new("app", "chat", Some(&registry)).unwrap();
    assert_eq!(topic.channel("message").unwrap().build().unwrap(), "app/chat/message");

    let err = TopicBuilder::new("app", "missing", Some(&registry)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Topic);
}

#[test]
fn channel_validation_is_case_sensitive_for_every_name() {
    let scope = chat();
    for name in scope.channel_names() {
        let topic = builder().channel(&name).unwrap().build().unwrap();
        assert!(topic.starts_with("test_app/chat/"));
        assert!(topic.ends_with(&name));
        assert!(builder().channel(&name.to_uppercase()).is_err());
    }
}
