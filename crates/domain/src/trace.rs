use serde::Serialize;

/// Structured trace events emitted across all ChatDesk crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ChatApiCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    ConversationLoaded {
        session_id: String,
        messages: usize,
    },
    PlaceholderResolved {
        session_id: String,
        placeholder_id: String,
        message_id: String,
        error: bool,
    },
    StaleCompletion {
        session_id: String,
        placeholder_id: String,
    },
    ConversationCleared {
        session_id: String,
        messages: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cd_event");
    }
}
