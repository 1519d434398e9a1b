//! `chatdesk send`: one-shot message command.
//!
//! Sends a single message on the device's session, prints the reply, and
//! exits.  Useful for scripting and quick checks against the backend.

use super::context::ChatContext;
use super::render::render_reply;

/// Send `message` and print the reply.
///
/// Returns `false` when the reply is an error entry so the caller can set
/// a non-zero exit status.
pub async fn send(
    ctx: &ChatContext,
    message: &str,
    customer: Option<&str>,
    json_output: bool,
) -> anyhow::Result<bool> {
    let customer = ctx.customer(customer)?;
    let Some(reply) = ctx.send(message, customer).await else {
        return Ok(true);
    };

    if json_output {
        let json = serde_json::to_string_pretty(&reply)
            .map_err(|e| anyhow::anyhow!("serializing reply: {e}"))?;
        println!("{json}");
    } else if reply.error {
        eprintln!("{}", render_reply(&reply, false));
    } else {
        println!("{}", render_reply(&reply, false));
    }

    Ok(!reply.error)
}
