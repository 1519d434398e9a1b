use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Environment variable that overrides `api.endpoint`.
pub const CHAT_API_ENV: &str = "CHATDESK_CHAT_API";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Full URL the prompt is POSTed to.
    #[serde(default = "d_endpoint")]
    pub endpoint: String,
    /// Whole-request timeout.  A send that exceeds it is reported as a
    /// transport error in place of its placeholder.
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: d_endpoint(),
            timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    /// Apply the `CHATDESK_CHAT_API` override when it is set and non-empty.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(url) = std::env::var(CHAT_API_ENV) {
            if !url.trim().is_empty() {
                self.endpoint = url.trim().to_owned();
            }
        }
        self
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_endpoint() -> String {
    "http://localhost:5003/chat".into()
}
fn d_30000() -> u64 {
    30_000
}
