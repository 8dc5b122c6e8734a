//! Validation pipelines.
//!
//! Every envelope kind owns one static [`Pipeline`]: a flat list of
//! set-if-absent defaults, a list of back-compat shims, and a list of
//! predicate checks. Construction runs them in that order; reconstituting
//! from the wire skips the defaults.

use switchboard_id::{EventId, MessageId};

use crate::error::FieldError;
use crate::value::{Payload, Timestamp, Value};

/// Produces a default value for an absent field.
pub type Generator = fn() -> Value;

/// Normalises a payload before checks run. Must not fail.
pub type Shim = fn(&mut Payload);

/// A single validation predicate.
pub type Check = fn(&Payload) -> Result<(), FieldError>;

/// A set-if-absent default for one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDefault {
    pub field: &'static str,
    pub value: Generator,
}

impl FieldDefault {
    pub const fn new(field: &'static str, value: Generator) -> Self {
        Self { field, value }
    }
}

/// Whether default filling runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Building from caller-supplied fields: defaults, shims, checks.
    Construct,
    /// Reconstituting a payload that is already complete: shims, checks.
    Wire,
}

/// An ordered validation pipeline for one envelope kind.
#[derive(Debug)]
pub struct Pipeline {
    pub defaults: &'static [FieldDefault],
    pub shims: &'static [Shim],
    pub checks: &'static [Check],
}

impl Pipeline {
    pub fn fill_defaults(&self, payload: &mut Payload) {
        for default in self.defaults {
            payload.set_default(default.field, default.value);
        }
    }

    /// Runs shims then checks, stopping at the first failure.
    pub fn validate(&self, payload: &mut Payload) -> Result<(), FieldError> {
        for shim in self.shims {
            shim(payload);
        }
        for check in self.checks {
            check(payload)?;
        }
        Ok(())
    }

    pub fn run(&self, payload: &mut Payload, mode: Mode) -> Result<(), FieldError> {
        if mode == Mode::Construct {
            self.fill_defaults(payload);
        }
        self.validate(payload)
    }
}

// =============================================================================
// Generators
// =============================================================================

pub(crate) fn null() -> Value {
    Value::Null
}

pub(crate) fn empty_object() -> Value {
    Value::Object(Payload::new())
}

pub(crate) fn now() -> Value {
    Value::DateTime(Timestamp::now())
}

pub(crate) fn new_message_id() -> Value {
    MessageId::generate().into()
}

pub(crate) fn new_event_id() -> Value {
    EventId::generate().into()
}

// =============================================================================
// Assertions
// =============================================================================

pub(crate) fn assert_present(payload: &Payload, fields: &[&str]) -> Result<(), FieldError> {
    match fields.iter().find(|field| !payload.contains_key(field)) {
        Some(field) => Err(FieldError::missing(*field)),
        None => Ok(()),
    }
}

pub(crate) fn require<'a>(payload: &'a Payload, field: &str) -> Result<&'a Value, FieldError> {
    payload
        .get(field)
        .ok_or_else(|| FieldError::missing(field))
}

// =============================================================================
// Lifting into typed records
// =============================================================================

/// Removes a present field.
pub(crate) fn take(payload: &mut Payload, field: &str) -> Result<Value, FieldError> {
    payload
        .remove(field)
        .ok_or_else(|| FieldError::missing(field))
}

/// Removes a present, nullable string field.
///
/// A date-time is accepted and rendered back to the text it was decoded
/// from, since the decoder reclassifies any member string that looks like
/// one.
pub(crate) fn take_opt_string(
    payload: &mut Payload,
    field: &str,
) -> Result<Option<String>, FieldError> {
    match take(payload, field)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::DateTime(ts) => Ok(Some(ts.to_source())),
        other => Err(FieldError::invalid(
            field,
            format!("expected a string or null, got {}", other.kind()),
        )),
    }
}

/// Removes a present, non-null string field.
pub(crate) fn take_string(payload: &mut Payload, field: &str) -> Result<String, FieldError> {
    take_opt_string(payload, field)?
        .ok_or_else(|| FieldError::invalid(field, "must not be null"))
}

/// Removes a present object field. Null stays `None`.
pub(crate) fn take_opt_object(
    payload: &mut Payload,
    field: &str,
) -> Result<Option<Payload>, FieldError> {
    object_or_null(field, take(payload, field)?)
}

pub(crate) fn object_or_null(field: &str, value: Value) -> Result<Option<Payload>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(FieldError::invalid(
            field,
            format!("expected an object or null, got {}", other.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_has_a(payload: &Payload) -> Result<(), FieldError> {
        assert_present(payload, &["a"])
    }

    fn shim_b(payload: &mut Payload) {
        payload.set_default("b", null);
    }

    fn seven() -> Value {
        Value::from(7i64)
    }

    static PIPELINE: Pipeline = Pipeline {
        defaults: &[FieldDefault::new("a", seven)],
        shims: &[shim_b],
        checks: &[check_has_a],
    };

    #[test]
    fn test_construct_fills_defaults() {
        let mut payload = Payload::new();
        PIPELINE.run(&mut payload, Mode::Construct).unwrap();
        assert_eq!(payload.get("a"), Some(&Value::from(7i64)));
        assert_eq!(payload.get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_wire_skips_defaults_but_runs_shims() {
        let mut payload = Payload::new();
        let err = PIPELINE.run(&mut payload, Mode::Wire).unwrap_err();
        assert_eq!(err, FieldError::missing("a"));
        assert_eq!(payload.get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_defaults_never_overwrite() {
        let mut payload = Payload::new().with("a", Value::Null);
        PIPELINE.run(&mut payload, Mode::Construct).unwrap();
        assert_eq!(payload.get("a"), Some(&Value::Null));
    }

    #[test]
    fn test_assert_present_reports_first_missing() {
        let payload = Payload::new().with("x", 1i64);
        assert_eq!(
            assert_present(&payload, &["x", "y", "z"]),
            Err(FieldError::missing("y"))
        );
    }

    #[test]
    fn test_take_string_rules() {
        let mut payload = Payload::new()
            .with("s", "hi")
            .with("n", Value::Null)
            .with("num", 3i64);
        assert_eq!(take_string(&mut payload, "s").unwrap(), "hi");
        assert!(take_string(&mut payload, "n").unwrap_err().is_invalid());
        assert!(take_string(&mut payload, "num").unwrap_err().is_invalid());
        assert!(take_string(&mut payload, "gone").unwrap_err().is_missing());
    }

    #[test]
    fn test_take_opt_string_renders_datetimes() {
        let ts = Timestamp::parse("2012-01-02 03:04:05.6").unwrap();
        let mut payload = Payload::new().with("to_addr", ts);
        assert_eq!(
            take_opt_string(&mut payload, "to_addr").unwrap().as_deref(),
            Some("2012-01-02 03:04:05.6")
        );
    }

    #[test]
    fn test_take_opt_object_keeps_null() {
        let mut payload = Payload::new()
            .with("meta", Payload::new().with("k", "v"))
            .with("none", Value::Null)
            .with("bad", "x");
        assert_eq!(
            take_opt_object(&mut payload, "meta").unwrap(),
            Some(Payload::new().with("k", "v"))
        );
        assert_eq!(take_opt_object(&mut payload, "none").unwrap(), None);
        assert!(take_opt_object(&mut payload, "bad").unwrap_err().is_invalid());
        assert!(take_opt_object(&mut payload, "absent").unwrap_err().is_missing());
    }
}
