//! `chatdesk history` and `chatdesk clear`.

use super::context::ChatContext;
use super::render::render_entry;

/// Print the session's conversation.
pub fn history(ctx: &ChatContext, raw: bool, json_output: bool) -> anyhow::Result<()> {
    let messages = ctx.store.messages();

    if json_output {
        let json = serde_json::to_string_pretty(&messages)
            .map_err(|e| anyhow::anyhow!("serializing history: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if messages.is_empty() {
        eprintln!("No messages in session {}", ctx.store.session_id());
        return Ok(());
    }
    for message in &messages {
        println!("{}", render_entry(message, raw));
    }
    Ok(())
}

/// Delete the session's conversation.
pub fn clear(ctx: &ChatContext) {
    let count = ctx.store.len();
    ctx.store.clear();
    println!(
        "Cleared {count} message(s) from session {}",
        ctx.store.session_id()
    );
}
