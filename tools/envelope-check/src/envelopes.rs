//! Loading envelopes from files and dispatching on `message_type`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use switchboard_message::codec;
use switchboard_message::{
    Envelope, Event, FieldError, MessageError, Payload, UserMessage, Value, EVENT_MESSAGE_TYPE,
    USER_MESSAGE_TYPE,
};
use walkdir::WalkDir;

/// A validated envelope of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEnvelope {
    UserMessage(UserMessage),
    Event(Event),
}

impl AnyEnvelope {
    /// Validates a wire payload as the kind its `message_type` names.
    pub fn from_payload(payload: Payload) -> Result<Self, FieldError> {
        let message_type = match payload.get("message_type") {
            None => return Err(FieldError::missing("message_type")),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(FieldError::invalid(
                    "message_type",
                    format!("expected a string, got {}", other.kind()),
                ))
            }
        };

        match message_type.as_str() {
            USER_MESSAGE_TYPE => UserMessage::from_wire(payload).map(AnyEnvelope::UserMessage),
            EVENT_MESSAGE_TYPE => Event::from_wire(payload).map(AnyEnvelope::Event),
            other => Err(FieldError::invalid(
                "message_type",
                format!("unknown message_type {:?}", other),
            )),
        }
    }

    pub fn message_type(&self) -> &str {
        match self {
            AnyEnvelope::UserMessage(m) => m.message_type(),
            AnyEnvelope::Event(e) => e.message_type(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AnyEnvelope::UserMessage(m) => m.message_id().as_str(),
            AnyEnvelope::Event(e) => e.event_id().as_str(),
        }
    }
}

/// Outcome of checking one envelope.
#[derive(Debug)]
pub struct Checked {
    /// `path` for a single object, `path[index]` for array entries.
    pub source: String,
    pub result: Result<AnyEnvelope, MessageError>,
}

/// Expands directories into the `*.json` files below them, sorted.
/// Plain file paths are kept as given.
pub fn discover(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
                .collect();
            found.sort();
            files.extend(found);
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(anyhow!("no such file or directory: {}", path.display()));
        }
    }
    Ok(files)
}

/// Checks every envelope in a JSON document.
pub fn check_text(source: &str, text: &str) -> Vec<Checked> {
    let is_batch = text.trim_start().starts_with('[');
    let payloads = match codec::decode_any(text) {
        Ok(payloads) => payloads,
        Err(err) => {
            return vec![Checked {
                source: source.to_string(),
                result: Err(err.into()),
            }]
        }
    };

    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| Checked {
            source: if is_batch {
                format!("{}[{}]", source, index)
            } else {
                source.to_string()
            },
            result: AnyEnvelope::from_payload(payload).map_err(MessageError::from),
        })
        .collect()
}

pub fn check_file(path: &Path) -> Result<Vec<Checked>> {
    let text = read_file(path)?;
    Ok(check_text(&path.display().to_string(), &text))
}

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Reads a file that must hold exactly one user message.
pub fn load_user_message(path: &Path) -> Result<UserMessage> {
    let text = read_file(path)?;
    UserMessage::from_json(&text)
        .with_context(|| format!("invalid user message: {}", path.display()))
}
