//! # switchboard-id
//!
//! Identifier types for switchboard envelopes.
//!
//! ## Design Principles
//!
//! - Ids are opaque strings on the wire; ids received from other producers
//!   are carried verbatim and never re-validated
//! - Freshly generated ids are the 32-character lowercase hex form of a
//!   random UUID, with no separators
//! - Ids are typed so that a message id cannot be passed where an event id
//!   is expected
//!
//! Examples:
//! - `MessageId`: `0f6e2a6b4c0d4c6f9a1d7b2e3c4f5a6b`
//! - `EventId`: `8d1c3f5e7a9b4d2c8e6f0a1b2c3d4e5f`

mod macros;
mod types;

pub use types::*;

/// Generates a fresh unique token.
///
/// Backed by the process-wide random source; there is no shared counter
/// or other state threaded through callers.
#[must_use]
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
