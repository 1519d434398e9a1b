//! Request DTOs for the chat endpoint.
//!
//! Field names are `snake_case` on the wire, matching the assistant
//! backend's `{ prompt, session_id, customer_id? }` contract.

use serde::{Deserialize, Serialize};

/// Request body POSTed to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: &str, session_id: &str, customer_id: Option<&str>) -> Self {
        Self {
            prompt: prompt.to_owned(),
            session_id: session_id.to_owned(),
            customer_id: customer_id
                .filter(|id| !id.is_empty())
                .map(str::to_owned),
        }
    }
}

/// Per-send options taken from the selected customer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub customer_id: Option<String>,
    /// Opaque, already-encoded credential.  Sent verbatim after `Basic `.
    pub credential_b64: Option<String>,
}

impl SendOptions {
    pub fn new(credential_b64: Option<&str>, customer_id: Option<&str>) -> Self {
        Self {
            customer_id: customer_id.map(str::to_owned),
            credential_b64: credential_b64.map(str::to_owned),
        }
    }

    /// The credential to attach, if any.  Empty strings count as absent.
    pub fn credential(&self) -> Option<&str> {
        self.credential_b64.as_deref().filter(|c| !c.is_empty())
    }
}
