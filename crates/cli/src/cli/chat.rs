//! `chatdesk chat`: interactive REPL command.
//!
//! Opens a readline-based loop that sends each line to the assistant as the
//! selected customer and prints the interpreted reply.  Slash-commands pick
//! the customer, insert canned prompts, and manage the conversation.

use rustyline::error::ReadlineError;

use super::context::ChatContext;
use super::render::{red, render_entry, render_reply};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
///
/// `customer` picks the customer for this run and becomes the stored
/// selection.
pub async fn chat(ctx: ChatContext, customer: Option<String>) -> anyhow::Result<()> {
    if let Some(id) = customer.as_deref() {
        ctx.customer(Some(id))?;
        ctx.selection.set(id);
    }
    ctx.remember_customer();

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".chatdesk")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Banner goes to stderr so stdout carries only the conversation.
    eprintln!("ChatDesk interactive chat");
    eprintln!(
        "Session: {}  |  Acting as: {}",
        ctx.store.session_id(),
        acting_as(&ctx)
    );
    eprintln!("Type /help for commands, Ctrl+D to exit");
    eprintln!();

    let mut state = ReplState::default();
    if !ctx.store.is_empty() {
        eprintln!("({} earlier messages, /history to show)", ctx.store.len());
    }

    loop {
        let readline = match state.prefill.take() {
            Some(text) => rl.readline_with_initial("you> ", (text.as_str(), "")),
            None => rl.readline("you> "),
        };

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                // ── Slash commands ────────────────────────────────
                if trimmed.starts_with('/') {
                    if handle_slash_command(&ctx, &mut state, trimmed) == Flow::Exit {
                        break;
                    }
                    continue;
                }

                // ── User message → assistant reply ───────────────
                if let Err(e) = send_message(&ctx, &state, trimmed).await {
                    eprintln!("{}", red(&format!("error: {e}")));
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("{}", red(&format!("readline error: {e}")));
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default)]
struct ReplState {
    /// Show structured replies as JSON.
    raw: bool,
    /// Text to pre-fill the next input line with.
    prefill: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Split `/cmd rest of line` into the command and its trimmed argument.
fn split_command(input: &str) -> (&str, Option<&str>) {
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());
    (cmd, arg)
}

fn handle_slash_command(ctx: &ChatContext, state: &mut ReplState, input: &str) -> Flow {
    let (cmd, arg) = split_command(input);

    match cmd {
        "/exit" | "/quit" => return Flow::Exit,

        "/customers" => {
            if ctx.catalog.customers.is_empty() {
                eprintln!("No customers configured.");
            }
            let current = ctx.customer(None).ok().flatten().map(|c| c.customer_id.clone());
            for c in &ctx.catalog.customers {
                let marker = if current.as_deref() == Some(c.customer_id.as_str()) {
                    "*"
                } else {
                    " "
                };
                eprintln!("{marker} {:<8} {}", c.customer_id, c.name);
            }
        }

        "/customer" => match arg {
            Some(id) => match ctx.catalog.customer(id) {
                Some(c) => {
                    ctx.selection.set(&c.customer_id);
                    eprintln!("Acting as {} ({})", c.name, c.customer_id);
                }
                None => eprintln!("Unknown customer: {id}  (see /customers)"),
            },
            None => {
                eprintln!("Acting as: {}", acting_as(ctx));
                eprintln!("Usage: /customer <id>");
            }
        },

        "/prompts" => {
            if ctx.catalog.prompts.is_empty() {
                eprintln!("No prompt templates configured.");
            }
            for p in &ctx.catalog.prompts {
                eprintln!("  {:<16} {}", p.id, p.label);
            }
        }

        "/prompt" => match arg.and_then(|id| ctx.catalog.prompt(id)) {
            Some(p) => state.prefill = Some(p.prompt.clone()),
            None => eprintln!("Usage: /prompt <id>  (see /prompts)"),
        },

        "/history" => {
            if ctx.store.is_empty() {
                eprintln!("(no messages yet)");
            }
            for message in ctx.store.messages() {
                println!("{}", render_entry(&message, state.raw));
            }
        }

        "/raw" => {
            state.raw = !state.raw;
            let mode = if state.raw { "on" } else { "off" };
            eprintln!("Raw JSON display {mode}");
        }

        "/new" => {
            ctx.store.clear();
            eprintln!("Conversation cleared.");
        }

        "/session" => {
            eprintln!("Session: {}", ctx.store.session_id());
            eprintln!("Storage key: {}", ctx.store.storage_key());
            eprintln!("Messages: {}", ctx.store.len());
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /customers       List customers");
            eprintln!("  /customer <id>   Act as another customer");
            eprintln!("  /prompts         List prompt templates");
            eprintln!("  /prompt <id>     Put a template on the input line");
            eprintln!("  /history         Show the conversation so far");
            eprintln!("  /raw             Toggle raw JSON display");
            eprintln!("  /new             Clear the conversation");
            eprintln!("  /session         Show the session id");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    Flow::Continue
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(ctx: &ChatContext, state: &ReplState, text: &str) -> anyhow::Result<()> {
    let customer = ctx.customer(None)?;
    let Some(reply) = ctx.send(text, customer).await else {
        return Ok(());
    };

    println!("{}", render_reply(&reply, state.raw));
    if let Some(error) = ctx.store.error() {
        eprintln!("{}", red(&format!("Send failed: {error}")));
    }
    println!();
    Ok(())
}

fn acting_as(ctx: &ChatContext) -> String {
    match ctx.customer(None) {
        Ok(Some(c)) => format!("{} ({})", c.name, c.customer_id),
        _ => "(no customer)".to_owned(),
    }
}
