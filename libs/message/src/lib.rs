//! # switchboard-message
//!
//! Envelope model and JSON wire codec for the switchboard messaging
//! middleware.
//!
//! ## Design Principles
//!
//! - An envelope is either fully valid or never constructed; every
//!   constructor returns `Result<_, FieldError>`
//! - Each envelope kind validates through one flat [`Pipeline`]: default
//!   filling, back-compat shims, then predicate checks
//! - Known fields live in typed records; unknown fields are carried in an
//!   `extra` side map so newer producers round-trip through older consumers
//! - Date-times travel as `YYYY-MM-DD HH:MM:SS.ffffff` strings
//!
//! ## Envelope Kinds
//!
//! - [`UserMessage`] (`message_type = "user_message"`): a message to or from
//!   a user, with addressing, content, session and transport identity
//! - [`Event`] (`message_type = "event"`): an `ack`, `nack` or
//!   `delivery_report` about a previously sent user message
//!
//! Both share a [`TransportHeader`] (version, type tag, timestamp, routing
//! metadata) and the operations of the [`Envelope`] trait.

pub mod codec;
mod envelope;
mod error;
mod event;
mod pipeline;
mod user_message;
mod value;

pub use envelope::*;
pub use error::{CodecError, FieldError, MessageError};
pub use event::*;
pub use pipeline::{FieldDefault, Mode, Pipeline};
pub use user_message::*;
pub use value::{Payload, Timestamp, Value};

pub use switchboard_id::{EventId, MessageId};
