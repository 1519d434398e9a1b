//! The `ChatBackend` trait defines the interface for anything that can turn
//! a prompt into an assistant reply (REST endpoint, test double).

use async_trait::async_trait;
use cd_domain::error::Result;
use cd_domain::message::Message;

use crate::types::SendOptions;

/// Abstraction over the remote assistant API.
///
/// One call is one network exchange: implementations must not retry.
/// Failures are returned as `cd_domain::error::Error`; the conversation
/// store decides how they are shown.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `prompt` for `session_id` and return the assistant reply as a
    /// freshly minted message.
    async fn send_prompt(
        &self,
        prompt: &str,
        session_id: &str,
        options: &SendOptions,
    ) -> Result<Message>;
}
