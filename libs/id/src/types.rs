//! Typed ID definitions for envelope fields.

use crate::define_id;

// =============================================================================
// User messages
// =============================================================================

define_id!(MessageId);

// =============================================================================
// Events
// =============================================================================

define_id!(EventId);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generated_id_is_simple_hex() {
        let id = MessageId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_ids_unique() {
        let a = EventId::generate();
        let b = EventId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wire_ids_are_taken_verbatim() {
        let id = MessageId::from("");
        assert_eq!(id.as_str(), "");
        let id = MessageId::from("abc".to_string());
        assert_eq!(id.to_string(), "abc");
    }

    #[test]
    fn test_json_is_plain_string() {
        let id = EventId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let parsed: EventId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed, id);
    }

    proptest! {
        #[test]
        fn wire_ids_survive_json(s in "[a-zA-Z0-9_.:+ -]{0,40}") {
            let id = MessageId::from(s.as_str());
            let json = serde_json::to_string(&id).unwrap();
            let back: MessageId = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back.as_str(), s.as_str());
            prop_assert_eq!(String::from(back), s);
        }
    }
}
