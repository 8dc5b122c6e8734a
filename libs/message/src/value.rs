//! In-memory payload model: JSON-compatible values plus date-times.

use chrono::{NaiveDateTime, SubsecRound, Timelike, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Number;
use switchboard_id::{EventId, MessageId};

use crate::error::CodecError;

// =============================================================================
// Timestamp
// =============================================================================

/// A naive date-time with microsecond precision.
///
/// Values are treated as naive UTC; no timezone travels on the wire.
/// A parsed timestamp remembers how many fractional digits its text had so
/// [`to_source`](Self::to_source) can reproduce that text. Equality, hashing
/// and ordering only look at the instant.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    at: NaiveDateTime,
    digits: u8,
}

impl Timestamp {
    /// Wire format used when rendering a timestamp.
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.6f";

    /// The current UTC time, truncated to whole microseconds.
    #[must_use]
    pub fn now() -> Self {
        Self::micros(Utc::now().naive_utc().trunc_subsecs(6))
    }

    /// Wraps a chrono value, refusing anything finer than a microsecond.
    pub fn from_naive(dt: NaiveDateTime) -> Result<Self, CodecError> {
        if dt.nanosecond() % 1_000 != 0 {
            return Err(CodecError::SubMicrosecond(dt.to_string()));
        }
        Ok(Self::micros(dt))
    }

    const fn micros(at: NaiveDateTime) -> Self {
        Self { at, digits: 6 }
    }

    /// Returns the underlying chrono value.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDateTime {
        self.at
    }

    /// Renders the timestamp as `YYYY-MM-DD HH:MM:SS.ffffff`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.at.format(Self::FORMAT).to_string()
    }

    /// Renders the timestamp with as many fractional digits as it was
    /// parsed with; six for timestamps that were not parsed.
    #[must_use]
    pub fn to_source(&self) -> String {
        if self.digits == 6 {
            return self.to_wire();
        }
        let micros = self.at.nanosecond() / 1_000;
        let fraction = micros / 10u32.pow(6 - u32::from(self.digits));
        format!(
            "{}.{:0width$}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            fraction,
            width = usize::from(self.digits)
        )
    }

    /// Parses `YYYY-MM-DD HH:MM:SS.f` where the fraction has one to six
    /// digits. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let (head, fraction) = s.rsplit_once('.')?;
        if !is_wire_head(head)
            || fraction.is_empty()
            || fraction.len() > 6
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let base = NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S").ok()?;
        let micros: u32 = format!("{:0<6}", fraction).parse().ok()?;
        let at = base.with_nanosecond(micros * 1_000)?;
        Some(Self {
            at,
            digits: fraction.len() as u8,
        })
    }
}

/// `YYYY-MM-DD HH:MM:SS` with every field zero-padded.
fn is_wire_head(head: &str) -> bool {
    head.len() == 19
        && head.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            10 => b == b' ',
            13 | 16 => b == b':',
            _ => b.is_ascii_digit(),
        })
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl Eq for Timestamp {}

impl std::hash::Hash for Timestamp {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.at.hash(state);
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl TryFrom<NaiveDateTime> for Timestamp {
    type Error = CodecError;

    fn try_from(dt: NaiveDateTime) -> Result<Self, Self::Error> {
        Self::from_naive(dt)
    }
}

// =============================================================================
// Value
// =============================================================================

/// A payload value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    DateTime(Timestamp),
    Array(Vec<Value>),
    Object(Payload),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::DateTime(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Payload> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::DateTime(_) => "date-time",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(ts) => serializer.serialize_str(&ts.to_wire()),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => map.serialize(serializer),
        }
    }
}

/// Plain structural conversion. Strings stay strings; the date-time
/// heuristic only runs inside [`crate::codec::decode`].
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::DateTime(ts)
    }
}

impl From<Payload> for Value {
    fn from(map: Payload) -> Self {
        Value::Object(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<MessageId> for Value {
    fn from(id: MessageId) -> Self {
        Value::String(id.into())
    }
}

impl From<EventId> for Value {
    fn from(id: EventId) -> Self {
        Value::String(id.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Payload
// =============================================================================

/// An insertion-ordered mapping from field names to values.
///
/// Equality ignores key order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload(IndexMap<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Inserts the generated value only when `key` is absent.
    pub fn set_default(&mut self, key: &str, value: impl FnOnce() -> Value) -> &mut Value {
        self.0.entry(key.to_string()).or_insert_with(value)
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(&mut self, other: Payload) {
        self.0.extend(other.0);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.0.values_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Payload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Payload {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Converts a JSON object; any other JSON value is rejected.
impl TryFrom<serde_json::Value> for Payload {
    type Error = CodecError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(value) {
            Value::Object(map) => Ok(map),
            other => Err(CodecError::UnexpectedShape {
                expected: "object",
                found: other.kind(),
            }),
        }
    }
}
