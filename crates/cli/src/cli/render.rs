//! Terminal rendering of conversation messages.
//!
//! A message whose text holds a JSON object or array is treated as a
//! structured backend payload: the interpreted human text comes first,
//! followed by the layout for known actions.  When neither applies the
//! payload is shown as pretty JSON.  Any other text is printed as-is.

use cd_domain::interpret::{parse_payload, pretty, structured_summary};
use cd_domain::message::{Message, Role};
use cd_domain::extract_human_message;

const RED: &str = "\x1B[31m";
const DIM: &str = "\x1B[2m";
const BOLD: &str = "\x1B[1m";
const RESET: &str = "\x1B[0m";

pub fn red(text: &str) -> String {
    format!("{RED}{text}{RESET}")
}

pub fn dim(text: &str) -> String {
    format!("{DIM}{text}{RESET}")
}

/// Display lines for a message body, without styling.
///
/// With `raw` set, structured payloads are followed by their pretty JSON.
pub fn body_lines(text: &str, raw: bool) -> Vec<String> {
    let Some(payload) = parse_payload(text) else {
        return lines_of(text);
    };

    let human = extract_human_message(&payload);
    let summary = structured_summary(&payload);
    let interpreted = human.is_some() || summary.is_some();
    let mut lines = match (human, summary) {
        (Some(human), Some(summary)) => {
            let mut lines = lines_of(&human);
            lines.push(String::new());
            lines.extend(summary);
            lines
        }
        (Some(human), None) => lines_of(&human),
        (None, Some(summary)) => summary,
        (None, None) => lines_of(&pretty(&payload)),
    };

    if raw && interpreted {
        lines.push(String::new());
        lines.extend(lines_of(&pretty(&payload)));
    }
    lines
}

/// A reply as printed after a send: dim while pending, red on failure.
pub fn render_reply(message: &Message, raw: bool) -> String {
    if message.is_temp {
        return dim(&message.text);
    }
    if message.error {
        return red(&format!("error: {}", message.text));
    }
    body_lines(&message.text, raw).join("\n")
}

/// One log entry with its time and speaker, as shown by `/history`.
pub fn render_entry(message: &Message, raw: bool) -> String {
    let stamp = message.timestamp.format("%H:%M");
    let speaker = match message.role {
        Role::User => format!("{BOLD}you{RESET}"),
        Role::Assistant => format!("{BOLD}assistant{RESET}"),
    };
    let header = dim(&format!("[{stamp}]"));

    match message.role {
        Role::User => format!("{header} {speaker}: {}", message.text),
        Role::Assistant => {
            let body = render_reply(message, raw);
            let indented: Vec<String> = body.lines().map(|l| format!("  {l}")).collect();
            format!("{header} {speaker}:\n{}", indented.join("\n"))
        }
    }
}

fn lines_of(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}
