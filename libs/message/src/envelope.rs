//! Transport envelope: the header shared by every envelope kind, and the
//! [`Envelope`] trait carrying the generic payload operations.

use crate::codec;
use crate::error::{CodecError, FieldError, MessageError};
use crate::pipeline::{self, FieldDefault, Mode, Pipeline};
use crate::value::{Payload, Timestamp, Value};

/// Wire version every transport envelope carries.
pub const MESSAGE_VERSION: &str = "20110921";

/// Routing endpoint used when none has been recorded.
pub const DEFAULT_ENDPOINT_NAME: &str = "default";

/// Key inside `routing_metadata` holding the endpoint name.
pub const ENDPOINT_NAME_KEY: &str = "endpoint_name";

/// Resolves an optional endpoint name, falling back to the default.
pub fn check_routing_endpoint(endpoint_name: Option<&str>) -> &str {
    endpoint_name.unwrap_or(DEFAULT_ENDPOINT_NAME)
}

// =============================================================================
// Transport header
// =============================================================================

/// Fields common to all transport envelopes.
///
/// `timestamp` is held as it arrived: producers that use another date
/// format are accepted and re-emitted untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportHeader {
    message_version: String,
    message_type: String,
    timestamp: Value,
    routing_metadata: Option<Payload>,
}

impl TransportHeader {
    /// Removes the header fields from a validated payload.
    ///
    /// Absent `routing_metadata` becomes an empty map; null is kept.
    pub(crate) fn lift(payload: &mut Payload) -> Result<Self, FieldError> {
        let routing_metadata = match payload.remove("routing_metadata") {
            None => Some(Payload::new()),
            Some(value) => pipeline::object_or_null("routing_metadata", value)?,
        };

        Ok(Self {
            message_version: pipeline::take_string(payload, "message_version")?,
            message_type: pipeline::take_string(payload, "message_type")?,
            timestamp: pipeline::take(payload, "timestamp")?,
            routing_metadata,
        })
    }

    pub(crate) fn write_into(&self, payload: &mut Payload) {
        payload.insert("message_version", self.message_version.as_str());
        payload.insert("message_type", self.message_type.as_str());
        payload.insert("timestamp", self.timestamp.clone());
        payload.insert("routing_metadata", self.routing_metadata.clone());
    }

    pub fn message_version(&self) -> &str {
        &self.message_version
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// The timestamp, when it is in the wire date-time format.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
            .as_timestamp()
            .or_else(|| self.timestamp.as_str().and_then(Timestamp::parse))
    }

    /// The `timestamp` field exactly as carried.
    pub fn raw_timestamp(&self) -> &Value {
        &self.timestamp
    }

    pub fn routing_metadata(&self) -> Option<&Payload> {
        self.routing_metadata.as_ref()
    }

    /// The recorded endpoint name, or [`DEFAULT_ENDPOINT_NAME`].
    ///
    /// A non-string `endpoint_name` counts as unset.
    pub fn routing_endpoint(&self) -> &str {
        check_routing_endpoint(
            self.routing_metadata
                .as_ref()
                .and_then(|metadata| metadata.get(ENDPOINT_NAME_KEY))
                .and_then(Value::as_str),
        )
    }

    /// Records an endpoint name; `None` records the default. Null routing
    /// metadata is replaced by a map holding just the name.
    pub fn set_routing_endpoint(&mut self, endpoint_name: Option<&str>) {
        let endpoint_name = check_routing_endpoint(endpoint_name).to_string();
        self.routing_metadata
            .get_or_insert_with(Payload::new)
            .insert(ENDPOINT_NAME_KEY, endpoint_name);
    }
}

// =============================================================================
// Transport pipeline steps
// =============================================================================

pub(crate) fn default_version() -> Value {
    Value::from(MESSAGE_VERSION)
}

pub(crate) fn default_message_type<E: Envelope>() -> Value {
    Value::from(E::MESSAGE_TYPE)
}

pub(crate) const VERSION_DEFAULT: FieldDefault =
    FieldDefault::new("message_version", default_version);
pub(crate) const TIMESTAMP_DEFAULT: FieldDefault = FieldDefault::new("timestamp", pipeline::now);
pub(crate) const ROUTING_DEFAULT: FieldDefault =
    FieldDefault::new("routing_metadata", pipeline::empty_object);

pub(crate) fn check_version(payload: &Payload) -> Result<(), FieldError> {
    let version = pipeline::require(payload, "message_version")?;
    if version.as_str() != Some(MESSAGE_VERSION) {
        return Err(FieldError::invalid(
            "message_version",
            format!("expected {:?}", MESSAGE_VERSION),
        ));
    }
    Ok(())
}

pub(crate) fn check_message_type(payload: &Payload) -> Result<(), FieldError> {
    if pipeline::require(payload, "message_type")?.is_null() {
        return Err(FieldError::invalid("message_type", "must not be null"));
    }
    Ok(())
}

pub(crate) fn check_timestamp(payload: &Payload) -> Result<(), FieldError> {
    pipeline::assert_present(payload, &["timestamp"])
}

// =============================================================================
// Envelope trait
// =============================================================================

/// Operations shared by every envelope kind.
///
/// Implementors supply their pipeline and the conversion between a validated
/// payload and their typed record; everything else is provided.
pub trait Envelope: Sized {
    /// Name used when rendering the envelope for humans.
    const KIND: &'static str;

    /// Value written to `message_type` when constructing this kind.
    const MESSAGE_TYPE: &'static str;

    fn pipeline() -> &'static Pipeline;

    /// Builds the typed record from a payload that passed the pipeline.
    fn lift(payload: Payload) -> Result<Self, FieldError>;

    /// Renders the envelope back into a payload, unknown fields included.
    fn to_payload(&self) -> Payload;

    fn header(&self) -> &TransportHeader;

    fn header_mut(&mut self) -> &mut TransportHeader;

    /// Applies defaults, validates, and builds the envelope.
    fn from_fields(mut fields: Payload) -> Result<Self, FieldError> {
        Self::pipeline().run(&mut fields, Mode::Construct)?;
        Self::lift(fields)
    }

    /// Validates a payload that is already complete, without defaults.
    fn from_wire(mut fields: Payload) -> Result<Self, FieldError> {
        Self::pipeline().run(&mut fields, Mode::Wire)?;
        Self::lift(fields)
    }

    fn from_json(text: &str) -> Result<Self, MessageError> {
        let payload = codec::decode(text)?;
        Ok(Self::from_wire(payload)?)
    }

    fn to_json(&self) -> Result<String, CodecError> {
        codec::encode(&self.to_payload())
    }

    /// An independent copy made by encoding and decoding this envelope.
    fn copy(&self) -> Result<Self, MessageError> {
        Self::from_json(&self.to_json()?)
    }

    fn contains(&self, key: &str) -> bool {
        self.to_payload().contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Value, FieldError> {
        self.to_payload()
            .remove(key)
            .ok_or_else(|| FieldError::missing(key))
    }

    fn get_or(&self, key: &str, default: Value) -> Value {
        self.to_payload().remove(key).unwrap_or(default)
    }

    /// Writes a field.
    ///
    /// Unknown keys are always accepted. Unlike a plain map write, a write
    /// to a known field is revalidated: the typed record cannot hold a value
    /// that breaks a field invariant, so such a write returns the error and
    /// leaves the envelope untouched.
    fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let mut payload = self.to_payload();
        payload.insert(key, value);
        *self = Self::from_wire(payload)?;
        Ok(())
    }

    fn message_type(&self) -> &str {
        self.header().message_type()
    }

    fn timestamp(&self) -> Option<Timestamp> {
        self.header().timestamp()
    }

    fn routing_endpoint(&self) -> &str {
        self.header().routing_endpoint()
    }

    fn set_routing_endpoint(&mut self, endpoint_name: Option<&str>) {
        self.header_mut().set_routing_endpoint(endpoint_name);
    }
}

/// Renders `<Kind payload=...>` for `Display` impls.
pub(crate) fn describe<E: Envelope>(
    envelope: &E,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    match envelope.to_json() {
        Ok(json) => write!(f, "<{} payload={}>", E::KIND, json),
        Err(_) => write!(f, "<{} payload={:?}>", E::KIND, envelope.to_payload()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_payload() -> Payload {
        Payload::new()
            .with("message_version", MESSAGE_VERSION)
            .with("message_type", "user_message")
            .with("timestamp", Timestamp::now())
    }

    #[test]
    fn test_check_version_rejects_other_versions() {
        let payload = header_payload().with("message_version", "20100101");
        let err = check_version(&payload).unwrap_err();
        assert_eq!(err.field(), "message_version");
        assert!(err.is_invalid());
    }

    #[test]
    fn test_check_version_missing() {
        let mut payload = header_payload();
        payload.remove("message_version");
        assert_eq!(
            check_version(&payload),
            Err(FieldError::missing("message_version"))
        );
    }

    #[test]
    fn test_check_message_type_null_vs_absent() {
        let payload = header_payload().with("message_type", Value::Null);
        assert!(check_message_type(&payload).unwrap_err().is_invalid());

        let mut payload = header_payload();
        payload.remove("message_type");
        assert!(check_message_type(&payload).unwrap_err().is_missing());
    }

    #[test]
    fn test_header_lift_tolerates_missing_routing_metadata() {
        let mut payload = header_payload();
        let header = TransportHeader::lift(&mut payload).unwrap();
        assert!(payload.is_empty());
        assert_eq!(header.routing_metadata(), Some(&Payload::new()));
        assert_eq!(header.routing_endpoint(), DEFAULT_ENDPOINT_NAME);
    }

    #[test]
    fn test_header_keeps_null_routing_metadata() {
        let mut payload = header_payload().with("routing_metadata", Value::Null);
        let mut header = TransportHeader::lift(&mut payload).unwrap();
        assert_eq!(header.routing_metadata(), None);
        assert_eq!(header.routing_endpoint(), DEFAULT_ENDPOINT_NAME);

        let mut written = Payload::new();
        header.write_into(&mut written);
        assert_eq!(written.get("routing_metadata"), Some(&Value::Null));

        header.set_routing_endpoint(Some("sms_in"));
        assert_eq!(header.routing_endpoint(), "sms_in");
    }

    #[test]
    fn test_header_keeps_foreign_timestamp() {
        let mut payload = header_payload().with("timestamp", "2012-10-01T09:00:00Z");
        let header = TransportHeader::lift(&mut payload).unwrap();
        assert_eq!(header.timestamp(), None);
        assert_eq!(header.raw_timestamp(), &Value::from("2012-10-01T09:00:00Z"));
    }

    #[test]
    fn test_routing_endpoint_roundtrip() {
        let mut header = TransportHeader::lift(&mut header_payload()).unwrap();
        header.set_routing_endpoint(Some("outbound"));
        assert_eq!(header.routing_endpoint(), "outbound");
        header.set_routing_endpoint(None);
        assert_eq!(header.routing_endpoint(), DEFAULT_ENDPOINT_NAME);
        assert_eq!(
            header.routing_metadata().and_then(|m| m.get(ENDPOINT_NAME_KEY)),
            Some(&Value::from(DEFAULT_ENDPOINT_NAME))
        );
    }

    #[test]
    fn test_routing_endpoint_ignores_non_string() {
        let mut payload = header_payload()
            .with("routing_metadata", Payload::new().with(ENDPOINT_NAME_KEY, 5i64));
        let header = TransportHeader::lift(&mut payload).unwrap();
        assert_eq!(header.routing_endpoint(), DEFAULT_ENDPOINT_NAME);
    }

    #[test]
    fn test_check_routing_endpoint() {
        assert_eq!(check_routing_endpoint(None), "default");
        assert_eq!(check_routing_endpoint(Some("sms_out")), "sms_out");
    }
}
