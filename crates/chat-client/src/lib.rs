//! `cd-client`: the remote send gateway for ChatDesk.
//!
//! Provides the [`ChatBackend`] trait that abstracts over the assistant
//! API, a production REST implementation ([`RestChatClient`]), and the
//! request DTOs.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use cd_client::{ChatBackend, RestChatClient, SendOptions};
//! use cd_domain::config::ApiConfig;
//!
//! # async fn example() -> cd_domain::error::Result<()> {
//! let client = RestChatClient::new(&ApiConfig::default())?;
//! let reply = client
//!     .send_prompt(
//!         "What is my balance?",
//!         "0b6f6f3e-session",
//!         &SendOptions::new(Some("VGVzdEAy"), Some("C001")),
//!     )
//!     .await?;
//!
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod rest;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use backend::ChatBackend;
pub use rest::{display_text, from_reqwest, RestChatClient};
pub use types::{ChatRequest, SendOptions};

use std::sync::Arc;

use cd_domain::config::ApiConfig;
use cd_domain::error::Result;

/// Build the [`ChatBackend`] for the configured endpoint.
pub fn create_backend(cfg: &ApiConfig) -> Result<Arc<dyn ChatBackend>> {
    let client = RestChatClient::new(cfg)?;
    tracing::debug!(
        endpoint = %client.endpoint(),
        timeout_ms = cfg.timeout_ms,
        "chat backend ready"
    );
    Ok(Arc::new(client))
}
