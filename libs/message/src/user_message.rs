//! Messages to or from a user.

use switchboard_id::MessageId;

use crate::envelope::{self, Envelope, TransportHeader};
use crate::error::FieldError;
use crate::pipeline::{self, FieldDefault, Pipeline};
use crate::value::{Payload, Value};

// =============================================================================
// Session events
// =============================================================================

/// Session lifecycle signal.
///
/// The "no session" value is modelled as `Option::<SessionEvent>::None`.
/// Transports may send any of the four values to a worker; workers send
/// `None` (continue any existing session) or `Close` back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    New,
    Resume,
    Close,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::New => "new",
            SessionEvent::Resume => "resume",
            SessionEvent::Close => "close",
        }
    }

    /// Reads a wire value: null, `"new"`, `"resume"` or `"close"`.
    pub fn from_value(value: &Value) -> Result<Option<Self>, FieldError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => s.parse().map(Some),
            other => Err(invalid_session_event(other)),
        }
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionEvent {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(SessionEvent::New),
            "resume" => Ok(SessionEvent::Resume),
            "close" => Ok(SessionEvent::Close),
            other => Err(invalid_session_event(&Value::from(other))),
        }
    }
}

impl From<SessionEvent> for Value {
    fn from(event: SessionEvent) -> Self {
        Value::from(event.as_str())
    }
}

fn invalid_session_event(value: &Value) -> FieldError {
    let shown = match value {
        Value::String(s) => format!("{:?}", s),
        other => other.kind().to_string(),
    };
    FieldError::invalid("session_event", format!("invalid session_event {}", shown))
}

// =============================================================================
// Transport types
// =============================================================================

/// Canonical transport kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    HttpApi,
    Irc,
    Telnet,
    Twitter,
    Sms,
    Ussd,
    Xmpp,
    Mxit,
}

impl TransportType {
    pub const ALL: [TransportType; 8] = [
        TransportType::HttpApi,
        TransportType::Irc,
        TransportType::Telnet,
        TransportType::Twitter,
        TransportType::Sms,
        TransportType::Ussd,
        TransportType::Xmpp,
        TransportType::Mxit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::HttpApi => "http_api",
            TransportType::Irc => "irc",
            TransportType::Telnet => "telnet",
            TransportType::Twitter => "twitter",
            TransportType::Sms => "sms",
            TransportType::Ussd => "ussd",
            TransportType::Xmpp => "xmpp",
            TransportType::Mxit => "mxit",
        }
    }
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportType {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportType::ALL
            .into_iter()
            .find(|tt| tt.as_str() == s)
            .ok_or_else(|| {
                FieldError::invalid("transport_type", format!("unknown transport_type {:?}", s))
            })
    }
}

impl From<TransportType> for Value {
    fn from(tt: TransportType) -> Self {
        Value::from(tt.as_str())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Wire tag for user messages.
pub const USER_MESSAGE_TYPE: &str = "user_message";

/// Fields a reply always derives from its parent.
pub const REPLY_PROTECTED_FIELDS: [&str; 7] = [
    "to_addr",
    "from_addr",
    "group",
    "in_reply_to",
    "transport_name",
    "transport_type",
    "transport_metadata",
];

const REQUIRED_FIELDS: [&str; 11] = [
    "message_id",
    "to_addr",
    "from_addr",
    "in_reply_to",
    "session_event",
    "content",
    "transport_name",
    "transport_type",
    "transport_metadata",
    "helper_metadata",
    "group",
];

/// Older producers predate `group`.
fn default_group(payload: &mut Payload) {
    payload.set_default("group", pipeline::null);
}

fn check_required(payload: &Payload) -> Result<(), FieldError> {
    pipeline::assert_present(payload, &REQUIRED_FIELDS)
}

fn check_session_event(payload: &Payload) -> Result<(), FieldError> {
    SessionEvent::from_value(pipeline::require(payload, "session_event")?).map(|_| ())
}

fn check_transport_type(payload: &Payload) -> Result<(), FieldError> {
    match pipeline::require(payload, "transport_type")? {
        Value::Null => Ok(()),
        Value::String(s) => s.parse::<TransportType>().map(|_| ()),
        other => Err(FieldError::invalid(
            "transport_type",
            format!("expected a string or null, got {}", other.kind()),
        )),
    }
}

static PIPELINE: Pipeline = Pipeline {
    defaults: &[
        envelope::VERSION_DEFAULT,
        FieldDefault::new(
            "message_type",
            envelope::default_message_type::<UserMessage>,
        ),
        envelope::TIMESTAMP_DEFAULT,
        envelope::ROUTING_DEFAULT,
        FieldDefault::new("message_id", pipeline::new_message_id),
        FieldDefault::new("in_reply_to", pipeline::null),
        FieldDefault::new("session_event", pipeline::null),
        FieldDefault::new("content", pipeline::null),
        FieldDefault::new("transport_metadata", pipeline::empty_object),
        FieldDefault::new("helper_metadata", pipeline::empty_object),
        FieldDefault::new("group", pipeline::null),
    ],
    shims: &[default_group],
    checks: &[
        envelope::check_version,
        envelope::check_message_type,
        envelope::check_timestamp,
        check_required,
        check_session_event,
        check_transport_type,
    ],
};

// =============================================================================
// User message
// =============================================================================

/// Keyword arguments for [`UserMessage::reply`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOptions {
    /// Keep the session open (`None`) rather than closing it.
    pub continue_session: bool,
    /// Extra fields for the reply. These win over computed values, but may
    /// not name any of [`REPLY_PROTECTED_FIELDS`].
    pub overrides: Payload,
}

impl Default for ReplyOptions {
    fn default() -> Self {
        Self {
            continue_session: true,
            overrides: Payload::new(),
        }
    }
}

impl ReplyOptions {
    #[must_use]
    pub fn close_session(mut self) -> Self {
        self.continue_session = false;
        self
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key, value);
        self
    }
}

/// A message to or from a user.
///
/// `helper_metadata` is for dispatchers and side components such as failure
/// workers, not for transports or application workers.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMessage {
    header: TransportHeader,
    message_id: MessageId,
    to_addr: Option<String>,
    from_addr: Option<String>,
    in_reply_to: Option<MessageId>,
    session_event: Option<SessionEvent>,
    content: Option<String>,
    transport_name: Option<String>,
    transport_type: Option<TransportType>,
    transport_metadata: Option<Payload>,
    helper_metadata: Option<Payload>,
    group: Option<String>,
    extra: Payload,
}

impl UserMessage {
    /// Builds a fresh outbound message that is not a reply.
    ///
    /// `from_addr`, `transport_name` and `transport_type` default to null
    /// when `fields` does not supply them; `in_reply_to` and `session_event`
    /// are always null.
    pub fn send(
        to_addr: Option<&str>,
        content: Option<&str>,
        mut fields: Payload,
    ) -> Result<Self, FieldError> {
        fields.set_default("from_addr", pipeline::null);
        fields.set_default("transport_name", pipeline::null);
        fields.set_default("transport_type", pipeline::null);
        fields.insert("to_addr", to_addr);
        fields.insert("in_reply_to", Value::Null);
        fields.insert("content", content);
        fields.insert("session_event", Value::Null);
        Self::from_fields(fields)
    }

    /// Builds a reply addressed to this message's sender.
    ///
    /// The reply goes to `from_addr` even when this message was addressed to
    /// a whole group, which suits one-to-one channels and directed messages
    /// inside a group chat. `helper_metadata` is carried over as-is because
    /// existing consumers depend on it. The reply leaves through the endpoint
    /// this message arrived on.
    pub fn reply(&self, content: Option<&str>, options: ReplyOptions) -> Result<Self, FieldError> {
        if let Some(field) = REPLY_PROTECTED_FIELDS
            .iter()
            .find(|field| options.overrides.contains_key(field))
        {
            return Err(FieldError::invalid(*field, "may not be overridden"));
        }

        let session_event = if options.continue_session {
            None
        } else {
            Some(SessionEvent::Close)
        };

        let mut fields = Payload::new()
            .with("content", content)
            .with("helper_metadata", self.helper_metadata.clone())
            .with("session_event", session_event)
            .with("to_addr", self.from_addr.clone())
            .with("from_addr", self.to_addr.clone())
            .with("group", self.group.clone())
            .with("in_reply_to", self.message_id.clone())
            .with("transport_name", self.transport_name.clone())
            .with("transport_type", self.transport_type)
            .with("transport_metadata", self.transport_metadata.clone());
        fields.merge(options.overrides);

        let mut reply = Self::from_fields(fields)?;
        reply.set_routing_endpoint(Some(self.routing_endpoint()));
        Ok(reply)
    }

    /// Like [`reply`](Self::reply), but a message that belongs to a group is
    /// answered to the whole group (`to_addr` is null) rather than to the
    /// individual sender.
    pub fn reply_group(
        &self,
        content: Option<&str>,
        options: ReplyOptions,
    ) -> Result<Self, FieldError> {
        let mut reply = self.reply(content, options)?;
        if self.group.is_some() {
            reply.to_addr = None;
        }
        Ok(reply)
    }

    /// The originating party.
    pub fn user(&self) -> Option<&str> {
        self.from_addr.as_deref()
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn to_addr(&self) -> Option<&str> {
        self.to_addr.as_deref()
    }

    pub fn from_addr(&self) -> Option<&str> {
        self.from_addr.as_deref()
    }

    pub fn in_reply_to(&self) -> Option<&MessageId> {
        self.in_reply_to.as_ref()
    }

    pub fn session_event(&self) -> Option<SessionEvent> {
        self.session_event
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn transport_name(&self) -> Option<&str> {
        self.transport_name.as_deref()
    }

    pub fn transport_type(&self) -> Option<TransportType> {
        self.transport_type
    }

    /// `None` when the producer sent null.
    pub fn transport_metadata(&self) -> Option<&Payload> {
        self.transport_metadata.as_ref()
    }

    pub fn helper_metadata(&self) -> Option<&Payload> {
        self.helper_metadata.as_ref()
    }

    /// The group or channel; `None` for one-to-one messages.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Fields this model does not know about, kept for re-encoding.
    pub fn extra(&self) -> &Payload {
        &self.extra
    }
}

impl Envelope for UserMessage {
    const KIND: &'static str = "UserMessage";
    const MESSAGE_TYPE: &'static str = USER_MESSAGE_TYPE;

    fn pipeline() -> &'static Pipeline {
        &PIPELINE
    }

    fn lift(mut payload: Payload) -> Result<Self, FieldError> {
        let header = TransportHeader::lift(&mut payload)?;
        let session_event = SessionEvent::from_value(&pipeline::take(&mut payload, "session_event")?)?;
        let transport_type = pipeline::take_opt_string(&mut payload, "transport_type")?
            .map(|s| s.parse::<TransportType>())
            .transpose()?;

        Ok(Self {
            header,
            message_id: pipeline::take_string(&mut payload, "message_id")?.into(),
            to_addr: pipeline::take_opt_string(&mut payload, "to_addr")?,
            from_addr: pipeline::take_opt_string(&mut payload, "from_addr")?,
            in_reply_to: pipeline::take_opt_string(&mut payload, "in_reply_to")?.map(Into::into),
            session_event,
            content: pipeline::take_opt_string(&mut payload, "content")?,
            transport_name: pipeline::take_opt_string(&mut payload, "transport_name")?,
            transport_type,
            transport_metadata: pipeline::take_opt_object(&mut payload, "transport_metadata")?,
            helper_metadata: pipeline::take_opt_object(&mut payload, "helper_metadata")?,
            group: pipeline::take_opt_string(&mut payload, "group")?,
            extra: payload,
        })
    }

    fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        self.header.write_into(&mut payload);
        payload.insert("message_id", self.message_id.clone());
        payload.insert("to_addr", self.to_addr.clone());
        payload.insert("from_addr", self.from_addr.clone());
        payload.insert("in_reply_to", self.in_reply_to.clone());
        payload.insert("session_event", self.session_event);
        payload.insert("content", self.content.clone());
        payload.insert("transport_name", self.transport_name.clone());
        payload.insert("transport_type", self.transport_type);
        payload.insert("transport_metadata", self.transport_metadata.clone());
        payload.insert("helper_metadata", self.helper_metadata.clone());
        payload.insert("group", self.group.clone());
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

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        envelope::describe(self, f)
    }
}
