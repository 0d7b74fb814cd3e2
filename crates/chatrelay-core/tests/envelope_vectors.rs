//! Envelope codec vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chatrelay_core::protocol::{
    decode, decode_bytes, encode, AdminEvent, ContentKind, ControlWord, Envelope, MessageKind,
    Value,
};

mod vector_loader;
use vector_loader::load_str;

#[test]
fn parse_deliver_text() {
    let env = decode(&load_str("deliver_text.json")).unwrap();
    assert_eq!(env.kind, MessageKind::Deliver(ContentKind::Text));
    assert_eq!(env.emitter, "B");
    assert_eq!(env.receiver, "A");
    assert_eq!(env.value, Value::Text("hi".into()));
    assert_eq!(env.timestamp, Some(1717000000.5));
}

#[test]
fn parse_ping_control_word() {
    let env = decode(&load_str("sys_ping.json")).unwrap();
    assert_eq!(env.control_word(), Some(ControlWord::Ping));
    assert!(env.timestamp.is_none());
}

#[test]
fn parse_client_list_record_with_null_receiver() {
    let env = decode(&load_str("client_list.json")).unwrap();
    assert_eq!(env.kind, MessageKind::Deliver(ContentKind::ClientList));
    assert_eq!(env.receiver, "");
    let list = env.value.as_record().unwrap().as_array().unwrap();
    assert_eq!(list.len(), 3);
}

#[test]
fn parse_routing_log_keeps_wrapped_record() {
    let env = decode(&load_str("routing_log.json")).unwrap();
    assert_eq!(env.kind, MessageKind::Admin(AdminEvent::RoutingLog));
    let rec = env.value.as_record().unwrap();
    assert_eq!(rec["message_type"], "ENVOI_IMAGE");
}

#[test]
fn unknown_kinds_decode_to_catch_all() {
    let env = decode(&load_str("unknown_kind.json")).unwrap();
    assert_eq!(env.kind, MessageKind::Unknown("RECEPTION_STICKER".into()));

    let env = decode(&load_str("numeric_kind.json")).unwrap();
    assert_eq!(env.kind, MessageKind::Unknown("42".into()));
    assert_eq!(env.value, Value::Text(String::new()));
}

#[test]
fn malformed_envelopes_are_decode_errors() {
    for f in [
        "bad_missing_emitter.json",
        "bad_unknown_top_level.json",
        "bad_not_json.json",
    ] {
        let err = decode(&load_str(f)).expect_err(f);
        assert_eq!(err.code().as_str(), "DECODE_ERROR", "vector={f}");
    }
    let err = decode_bytes(&[0x7b, 0xff, 0xfe]).expect_err("invalid utf8");
    assert_eq!(err.code().as_str(), "DECODE_ERROR");
}

#[test]
fn encode_then_decode_is_identity() {
    let samples = vec![
        Envelope::declaration("A"),
        Envelope::control("A", ControlWord::MessageOk),
        Envelope::new(MessageKind::Send(ContentKind::Image), "A", "B", "IMG:AQID")
            .with_timestamp(12.25),
        Envelope::new(
            MessageKind::Deliver(ContentKind::ClientList),
            "SERVER",
            "",
            Value::Record(serde_json::json!(["A", "B"])),
        ),
        Envelope::new(
            MessageKind::Admin(AdminEvent::RoutingLog),
            "A",
            "B",
            Value::Record(serde_json::json!({"message_type": "ENVOI_TEXT", "value": "yo"})),
        ),
        Envelope::new(MessageKind::Unknown("FUTURE_KIND".into()), "A", "", "x"),
    ];

    for env in samples {
        let wire = encode(&env).unwrap();
        assert_eq!(decode(&wire).unwrap(), env, "wire={wire}");
    }
}

#[test]
fn encode_uses_server_field_names() {
    let wire = encode(&Envelope::control("A", ControlWord::Pong)).unwrap();
    let v: serde_json::Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(v["message_type"], "SYS_MESSAGE");
    assert_eq!(v["data"]["emitter"], "A");
    assert_eq!(v["data"]["receiver"], "");
    assert_eq!(v["data"]["value"], "pong");
    assert!(v["data"].get("timestamp").is_none());
}
