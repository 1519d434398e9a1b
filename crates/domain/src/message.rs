//! Conversation messages as stored in the per-session log.
//!
//! The wire/storage shape uses `camelCase` field names so a persisted log
//! reads `{"id", "role", "text", "timestamp", "isTemp", "error"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interim text shown while a request is in flight.
pub const PLACEHOLDER_TEXT: &str = "Thinking…";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Set on the optimistic placeholder that stands in for a pending reply.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_temp: bool,
    /// Set when the text describes a failed exchange.
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            is_temp: false,
            error: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// The temporary assistant entry appended while a send is in flight.
    pub fn placeholder() -> Self {
        Self {
            is_temp: true,
            ..Self::new(Role::Assistant, PLACEHOLDER_TEXT)
        }
    }

    /// An assistant entry describing a failed send.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::new(Role::Assistant, text)
        }
    }
}

/// Fresh, time-ordered message id.
pub fn next_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_temporary_assistant() {
        let msg = Message::placeholder();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.is_temp);
        assert!(!msg.error);
        assert_eq!(msg.text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn ids_are_unique() {
        let a = Message::user("a");
        let b = Message::user("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serializes_with_camel_case_flags() {
        let msg = Message::placeholder();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["isTemp"], true);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn omits_false_flags() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(json.get("isTemp").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn deserializes_minimal_record() {
        let raw = r#"{"id":"1700000000000-u","role":"user","text":"hi","timestamp":"2024-01-01T10:00:00.000Z"}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id, "1700000000000-u");
        assert_eq!(msg.role, Role::User);
        assert!(!msg.is_temp);
        assert!(!msg.error);
    }
}
