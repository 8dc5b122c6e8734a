//! JSON wire codec.
//!
//! Envelopes travel as UTF-8 JSON objects. Date-times are rendered as
//! `YYYY-MM-DD HH:MM:SS.ffffff` strings and recovered on decode by trying
//! every string that is the direct value of an object member against that
//! format. Strings that are direct elements of an array are left alone.
//!
//! The recovery is format-driven, so any member string shaped like a
//! timestamp comes back as a [`Value::DateTime`], whatever the field means.

use crate::error::CodecError;
use crate::value::{Payload, Timestamp, Value};

/// Encodes a payload as a JSON object.
pub fn encode(payload: &Payload) -> Result<String, CodecError> {
    Ok(serde_json::to_string(payload)?)
}

/// Decodes a JSON object into a payload, recovering date-times.
pub fn decode(text: &str) -> Result<Payload, CodecError> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    lift_object(raw)
}

/// Encodes a batch of payloads as a JSON array.
pub fn encode_batch(payloads: &[Payload]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(payloads)?)
}

/// Decodes a JSON array of objects.
pub fn decode_batch(text: &str) -> Result<Vec<Payload>, CodecError> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    let items = match raw {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(CodecError::UnexpectedShape {
                expected: "array",
                found: Value::from(other).kind(),
            })
        }
    };

    items.into_iter().map(lift_object).collect()
}

/// Decodes either a single JSON object or an array of objects.
pub fn decode_any(text: &str) -> Result<Vec<Payload>, CodecError> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    let items = match raw {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    items.into_iter().map(lift_object).collect()
}

fn lift_object(raw: serde_json::Value) -> Result<Payload, CodecError> {
    let mut payload = Payload::try_from(raw)?;
    recover_datetimes(&mut payload);
    Ok(payload)
}

fn recover_datetimes(object: &mut Payload) {
    for value in object.values_mut() {
        match value.as_str().and_then(Timestamp::parse) {
            Some(ts) => *value = Value::DateTime(ts),
            None => recover_nested(value),
        }
    }
}

fn recover_nested(value: &mut Value) {
    match value {
        Value::Object(map) => recover_datetimes(map),
        Value::Array(items) => items.iter_mut().for_each(recover_nested),
        _ => {}
    }
}
