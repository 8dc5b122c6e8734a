//! Events about previously sent user messages.

use switchboard_id::{EventId, MessageId};

use crate::envelope::{self, Envelope, TransportHeader};
use crate::error::FieldError;
use crate::pipeline::{self, FieldDefault, Pipeline};
use crate::value::{Payload, Value};

/// Wire tag for events.
pub const EVENT_MESSAGE_TYPE: &str = "event";

/// Delivery state reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Pending,
    Failed,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeliveryStatus::Pending),
            "failed" => Some(DeliveryStatus::Failed),
            "delivered" => Some(DeliveryStatus::Delivered),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DeliveryStatus> for Value {
    fn from(status: DeliveryStatus) -> Self {
        Value::from(status.as_str())
    }
}

// =============================================================================
// Event taxonomy
// =============================================================================

/// An extra field an event type requires, with its predicate.
#[derive(Debug, Clone, Copy)]
pub struct ExtraField {
    pub field: &'static str,
    pub check: fn(&Value) -> bool,
}

fn not_null(value: &Value) -> bool {
    !value.is_null()
}

fn known_delivery_status(value: &Value) -> bool {
    value.as_str().and_then(DeliveryStatus::parse).is_some()
}

/// The event taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Ack,
    Nack,
    DeliveryReport,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Ack, EventType::Nack, EventType::DeliveryReport];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Ack => "ack",
            EventType::Nack => "nack",
            EventType::DeliveryReport => "delivery_report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        EventType::ALL.into_iter().find(|et| et.as_str() == s)
    }

    /// Extra fields that must be present and pass their predicate.
    pub fn extra_fields(&self) -> &'static [ExtraField] {
        match self {
            EventType::Ack => ACK_FIELDS,
            EventType::Nack => NACK_FIELDS,
            EventType::DeliveryReport => DELIVERY_REPORT_FIELDS,
        }
    }
}

const ACK_FIELDS: &[ExtraField] = &[ExtraField {
    field: "sent_message_id",
    check: not_null,
}];

const NACK_FIELDS: &[ExtraField] = &[ExtraField {
    field: "nack_reason",
    check: not_null,
}];

const DELIVERY_REPORT_FIELDS: &[ExtraField] = &[ExtraField {
    field: "delivery_status",
    check: known_delivery_status,
}];

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-type specific data.
///
/// Transports supply `sent_message_id` and `nack_reason` in whatever shape
/// they have (numeric SMSC ids, structured reasons); only null is refused.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The transport accepted the message and gave it its own id.
    Ack { sent_message_id: Value },
    /// The transport refused the message.
    Nack { nack_reason: Value },
    /// The network reported on delivery.
    DeliveryReport { delivery_status: DeliveryStatus },
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Ack { .. } => EventType::Ack,
            EventKind::Nack { .. } => EventType::Nack,
            EventKind::DeliveryReport { .. } => EventType::DeliveryReport,
        }
    }

    fn lift(event_type: EventType, payload: &mut Payload) -> Result<Self, FieldError> {
        Ok(match event_type {
            EventType::Ack => EventKind::Ack {
                sent_message_id: pipeline::take(payload, "sent_message_id")?,
            },
            EventType::Nack => EventKind::Nack {
                nack_reason: pipeline::take(payload, "nack_reason")?,
            },
            EventType::DeliveryReport => {
                let status = pipeline::take_string(payload, "delivery_status")?;
                EventKind::DeliveryReport {
                    delivery_status: DeliveryStatus::parse(&status)
                        .ok_or_else(|| {
                            FieldError::invalid(
                                "delivery_status",
                                format!("unknown delivery_status {:?}", status),
                            )
                        })?,
                }
            }
        })
    }

    fn write_into(&self, payload: &mut Payload) {
        match self {
            EventKind::Ack { sent_message_id } => {
                payload.insert("sent_message_id", sent_message_id.clone());
            }
            EventKind::Nack { nack_reason } => {
                payload.insert("nack_reason", nack_reason.clone());
            }
            EventKind::DeliveryReport { delivery_status } => {
                payload.insert("delivery_status", *delivery_status);
            }
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

fn check_required(payload: &Payload) -> Result<(), FieldError> {
    pipeline::assert_present(payload, &["user_message_id", "event_id", "event_type"])
}

fn check_event_type(payload: &Payload) -> Result<(), FieldError> {
    let raw = pipeline::require(payload, "event_type")?;
    let event_type = raw.as_str().and_then(EventType::parse).ok_or_else(|| {
        let shown = match raw {
            Value::String(s) => format!("{:?}", s),
            other => other.kind().to_string(),
        };
        FieldError::invalid("event_type", format!("unknown event_type {}", shown))
    })?;

    for extra in event_type.extra_fields() {
        let value = pipeline::require(payload, extra.field)?;
        if !(extra.check)(value) {
            return Err(FieldError::invalid(extra.field, format!("invalid {}", extra.field)));
        }
    }
    Ok(())
}

static PIPELINE: Pipeline = Pipeline {
    defaults: &[
        envelope::VERSION_DEFAULT,
        FieldDefault::new("message_type", envelope::default_message_type::<Event>),
        envelope::TIMESTAMP_DEFAULT,
        envelope::ROUTING_DEFAULT,
        FieldDefault::new("event_id", pipeline::new_event_id),
    ],
    shims: &[],
    checks: &[
        envelope::check_version,
        envelope::check_message_type,
        envelope::check_timestamp,
        check_required,
        check_event_type,
    ],
};

// =============================================================================
// Event
// =============================================================================

/// A message about a [`UserMessage`](crate::UserMessage), correlated by id.
///
/// The referenced message may be unknown to whoever receives the event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    header: TransportHeader,
    user_message_id: MessageId,
    event_id: EventId,
    kind: EventKind,
    extra: Payload,
}

impl Event {
    /// An acknowledgement that the transport took the message.
    pub fn ack(
        user_message_id: impl Into<MessageId>,
        sent_message_id: impl Into<Value>,
    ) -> Result<Self, FieldError> {
        Self::build(user_message_id.into(), EventKind::Ack {
            sent_message_id: sent_message_id.into(),
        })
    }

    /// A refusal by the transport.
    pub fn nack(
        user_message_id: impl Into<MessageId>,
        nack_reason: impl Into<Value>,
    ) -> Result<Self, FieldError> {
        Self::build(user_message_id.into(), EventKind::Nack {
            nack_reason: nack_reason.into(),
        })
    }

    pub fn delivery_report(
        user_message_id: impl Into<MessageId>,
        delivery_status: DeliveryStatus,
    ) -> Result<Self, FieldError> {
        Self::build(user_message_id.into(), EventKind::DeliveryReport { delivery_status })
    }

    fn build(user_message_id: MessageId, kind: EventKind) -> Result<Self, FieldError> {
        let mut fields = Payload::new()
            .with("user_message_id", user_message_id)
            .with("event_type", kind.event_type().as_str());
        kind.write_into(&mut fields);
        Self::from_fields(fields)
    }

    pub fn user_message_id(&self) -> &MessageId {
        &self.user_message_id
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn extra(&self) -> &Payload {
        &self.extra
    }
}

impl Envelope for Event {
    const KIND: &'static str = "Event";
    const MESSAGE_TYPE: &'static str = EVENT_MESSAGE_TYPE;

    fn pipeline() -> &'static Pipeline {
        &PIPELINE
    }

    fn lift(mut payload: Payload) -> Result<Self, FieldError> {
        let header = TransportHeader::lift(&mut payload)?;
        let user_message_id = pipeline::take_string(&mut payload, "user_message_id")?.into();
        let event_id = pipeline::take_string(&mut payload, "event_id")?.into();
        let raw_type = pipeline::take_string(&mut payload, "event_type")?;
        let event_type = EventType::parse(&raw_type).ok_or_else(|| {
            FieldError::invalid("event_type", format!("unknown event_type {:?}", raw_type))
        })?;
        let kind = EventKind::lift(event_type, &mut payload)?;

        Ok(Self {
            header,
            user_message_id,
            event_id,
            kind,
            extra: payload,
        })
    }

    fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        self.header.write_into(&mut payload);
        payload.insert("user_message_id", self.user_message_id.clone());
        payload.insert("event_id", self.event_id.clone());
        payload.insert("event_type", self.event_type().as_str());
        self.kind.write_into(&mut payload);
        payload.merge(self.extra.clone());
        payload
    }

    fn header(&self) -> &TransportHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut TransportHeader {
        &mut self.header
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        envelope::describe(self, f)
    }
}
