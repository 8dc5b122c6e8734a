//! End-to-end envelope behaviour over the JSON wire format.

use switchboard_message::codec;
use switchboard_message::{
    DeliveryStatus, Envelope, Event, EventKind, FieldError, MessageError, Payload, ReplyOptions,
    SessionEvent, Timestamp, TransportType, UserMessage, Value, DEFAULT_ENDPOINT_NAME,
    MESSAGE_VERSION,
};

fn parent(group: Option<&str>) -> UserMessage {
    UserMessage::from_fields(
        Payload::new()
            .with("message_id", "abc")
            .with("from_addr", "+41791234567")
            .with("to_addr", "+123")
            .with("transport_name", "t")
            .with("transport_type", "sms")
            .with("group", group),
    )
    .unwrap()
}

#[test]
fn reply_swaps_addresses_and_links_parent() {
    let reply = parent(None).reply(Some("hi"), ReplyOptions::default()).unwrap();

    assert_eq!(reply.to_addr(), Some("+41791234567"));
    assert_eq!(reply.from_addr(), Some("+123"));
    assert_eq!(reply.in_reply_to().map(|id| id.as_str()), Some("abc"));
    assert_eq!(reply.session_event(), None);
    assert_eq!(reply.content(), Some("hi"));
}

#[test]
fn reply_group_targets_the_group() {
    let reply = parent(Some("g1"))
        .reply_group(Some("hi"), ReplyOptions::default())
        .unwrap();

    assert_eq!(reply.to_addr(), None);
    assert_eq!(reply.group(), Some("g1"));
}

#[test]
fn reply_rejects_caller_supplied_addressing() {
    let err = parent(None)
        .reply(Some("x"), ReplyOptions::default().with("to_addr", "+1"))
        .unwrap_err();
    assert!(err.is_invalid());
    assert_eq!(err.field(), "to_addr");
}

#[test]
fn envelope_without_group_still_decodes() {
    let mut payload = parent(None).to_payload();
    payload.remove("group");
    let text = codec::encode(&payload).unwrap();
    assert!(!text.contains("\"group\""));

    let decoded = UserMessage::from_json(&text).unwrap();
    assert_eq!(decoded.group(), None);
    assert_eq!(decoded.get("group").unwrap(), Value::Null);
}

#[test]
fn ack_without_sent_message_id_fails() {
    let fields = Payload::new()
        .with("user_message_id", "abc")
        .with("event_type", "ack")
        .with("sent_message_id", Value::Null);
    let err = Event::from_fields(fields).unwrap_err();
    assert_eq!(err.field(), "sent_message_id");
    assert!(err.is_invalid());
}

#[test]
fn payload_roundtrips_through_the_wire() {
    let mut message = parent(None);
    message
        .set(
            "transport_metadata",
            Payload::new()
                .with("received", Timestamp::now())
                .with("hops", vec![Value::from(1i64), Value::from(2i64)]),
        )
        .unwrap();

    let payload = message.to_payload();
    let decoded = codec::decode(&codec::encode(&payload).unwrap()).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn copy_is_equal_but_independent() {
    let original = parent(Some("g1"));
    let mut copy = original.copy().unwrap();
    assert_eq!(copy, original);

    copy.set("content", "changed").unwrap();
    assert_ne!(copy, original);
    assert_eq!(original.content(), None);
}

#[test]
fn event_copy_is_equal() {
    let event = Event::delivery_report("abc", DeliveryStatus::Pending).unwrap();
    assert_eq!(event.copy().unwrap(), event);
}

#[test]
fn wire_decode_skips_defaults() {
    let text = r#"{
        "message_version": "20110921",
        "message_type": "user_message",
        "timestamp": "2012-10-01 09:00:00.000000",
        "to_addr": "+1",
        "from_addr": "+2",
        "transport_name": "t",
        "transport_type": "sms"
    }"#;
    let err = UserMessage::from_json(text).unwrap_err();
    assert_eq!(
        err,
        MessageError::Field(FieldError::missing("message_id"))
    );
}

#[test]
fn wire_decode_validates_version() {
    let mut payload = parent(None).to_payload();
    payload.insert("message_version", "20120101");
    let err = UserMessage::from_json(&codec::encode(&payload).unwrap()).unwrap_err();
    let field_error = err.as_field_error().unwrap();
    assert_eq!(field_error.field(), "message_version");
    assert!(field_error.is_invalid());
}

#[test]
fn wire_decode_keeps_unknown_fields() {
    let mut payload = parent(None).to_payload();
    payload.insert("provider", "acme");
    let decoded = UserMessage::from_json(&codec::encode(&payload).unwrap()).unwrap();
    assert_eq!(decoded.extra().get("provider"), Some(&Value::from("acme")));

    let reencoded = decoded.to_json().unwrap();
    assert!(reencoded.contains("\"provider\":\"acme\""));
}

#[test]
fn timestamp_lookalike_content_survives_copy() {
    let mut message = parent(None);
    message.set("content", "2012-10-01 09:00:00.000000").unwrap();
    let copy = message.copy().unwrap();
    assert_eq!(copy.content(), Some("2012-10-01 09:00:00.000000"));
}

#[test]
fn short_fraction_lookalike_content_survives_copy() {
    let mut message = parent(None);
    message.set("content", "2012-10-01 09:00:00.5").unwrap();
    let copy = message.copy().unwrap();
    assert_eq!(copy.content(), Some("2012-10-01 09:00:00.5"));
    assert_eq!(copy, message);
}

#[test]
fn foreign_timestamp_and_null_metadata_reencode_unchanged() {
    let text = r#"{"message_version":"20110921","message_type":"user_message","timestamp":"2012-10-01T09:00:00Z","routing_metadata":null,"message_id":"abc","to_addr":"+1","from_addr":"+2","in_reply_to":null,"session_event":null,"content":"hi","transport_name":"t","transport_type":"sms","transport_metadata":null,"helper_metadata":{},"group":null}"#;
    let message = UserMessage::from_json(text).unwrap();

    assert_eq!(message.timestamp(), None);
    assert_eq!(
        message.header().raw_timestamp(),
        &Value::from("2012-10-01T09:00:00Z")
    );
    assert_eq!(message.transport_metadata(), None);
    assert_eq!(message.to_json().unwrap(), text);
}

#[test]
fn ack_with_numeric_transport_id_decodes() {
    let text = r#"{
        "message_version": "20110921",
        "message_type": "event",
        "timestamp": "2012-10-01 09:00:00.000000",
        "routing_metadata": {},
        "event_id": "e2",
        "user_message_id": "abc",
        "event_type": "ack",
        "sent_message_id": 12345
    }"#;
    let event = Event::from_json(text).unwrap();
    assert_eq!(
        event.kind(),
        &EventKind::Ack {
            sent_message_id: Value::from(12345i64)
        }
    );
    assert!(event.to_json().unwrap().contains("\"sent_message_id\":12345"));
}

#[test]
fn routing_endpoint_follows_reply() {
    let mut inbound = parent(None);
    assert_eq!(inbound.routing_endpoint(), DEFAULT_ENDPOINT_NAME);
    inbound.set_routing_endpoint(Some("sms_in"));

    let reply = inbound
        .reply(None, ReplyOptions::default().close_session())
        .unwrap();
    assert_eq!(reply.routing_endpoint(), "sms_in");
    assert_eq!(reply.session_event(), Some(SessionEvent::Close));
}

#[test]
fn events_decode_from_producer_json() {
    let text = r#"{
        "message_version": "20110921",
        "message_type": "event",
        "timestamp": "2012-10-01 09:00:00.5",
        "routing_metadata": {},
        "event_id": "e1",
        "user_message_id": "abc",
        "event_type": "nack",
        "nack_reason": "unroutable"
    }"#;
    let event = Event::from_json(text).unwrap();
    assert_eq!(event.header().message_version(), MESSAGE_VERSION);
    assert_eq!(event.event_id().as_str(), "e1");
    assert_eq!(
        event.kind(),
        &EventKind::Nack {
            nack_reason: Value::from("unroutable")
        }
    );
    assert_eq!(
        event.timestamp().unwrap().to_wire(),
        "2012-10-01 09:00:00.500000"
    );
}

#[test]
fn batch_of_user_messages() {
    let outbound = vec![
        UserMessage::send(Some("+1"), Some("one"), Payload::new()).unwrap(),
        UserMessage::send(
            Some("+2"),
            Some("two"),
            Payload::new().with("transport_type", TransportType::Sms),
        )
        .unwrap(),
    ];
    let payloads: Vec<Payload> = outbound.iter().map(Envelope::to_payload).collect();
    let text = codec::encode_batch(&payloads).unwrap();

    let decoded: Vec<UserMessage> = codec::decode_batch(&text)
        .unwrap()
        .into_iter()
        .map(|p| UserMessage::from_wire(p).unwrap())
        .collect();
    assert_eq!(decoded, outbound);
}
