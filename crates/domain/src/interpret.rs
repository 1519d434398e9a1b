//! Response interpretation: pull a human-readable sentence out of whatever
//! the assistant backend returned.
//!
//! The backend's payload shape is not under our control.  Depending on the
//! tool path it took, the user-facing text may sit in a top-level `message`,
//! inside `action_result`, be implied by a known `action`, or be buried in a
//! string field that itself holds JSON (sometimes encoded more than once).
//!
//! [`extract_human_message`] walks those shapes in a fixed priority order and
//! unwraps string-encoded JSON recursively, bounded by [`MAX_UNWRAP_DEPTH`].

use serde_json::{Map, Value};

/// Upper bound on nested objects / string-to-JSON unwraps followed before
/// giving up.
pub const MAX_UNWRAP_DEPTH: usize = 16;

const BULLET: &str = " • ";

/// Best plain-text summary of `payload`, or `None` when no rule matches.
///
/// Resolution order for an object (first match wins):
///
/// 1. non-empty string `message`
/// 2. non-empty string `action_result.message`
/// 3. `get_balance` action with a balance → synthesized sentence
/// 4. `get_customer_info` action → `" • "`-joined field summary
/// 5. `llm_output` (JSON string, object, or array of JSON strings), recursively
/// 6. any string field that parses as JSON, recursively, in document order
///
/// A string payload is parsed as JSON and interpreted in turn; any other
/// non-object yields `None`.
pub fn extract_human_message(payload: &Value) -> Option<String> {
    extract_at(payload, 0)
}

fn extract_at(payload: &Value, depth: usize) -> Option<String> {
    if depth > MAX_UNWRAP_DEPTH {
        tracing::debug!(depth, "payload nesting exceeds unwrap limit");
        return None;
    }

    match payload {
        Value::Object(map) => extract_from_object(map, depth),
        Value::String(s) => try_parse_json(s).and_then(|inner| extract_at(&inner, depth + 1)),
        _ => None,
    }
}

fn extract_from_object(map: &Map<String, Value>, depth: usize) -> Option<String> {
    if let Some(msg) = non_empty_str(map.get("message")) {
        return Some(msg.to_owned());
    }

    let result = map.get("action_result").and_then(Value::as_object);

    if let Some(msg) = non_empty_str(result.and_then(|r| r.get("message"))) {
        return Some(msg.to_owned());
    }

    if let Some(result) = result {
        match map.get("action").and_then(Value::as_str) {
            Some("get_balance") => {
                if let Some(balance) = present(result, "balance") {
                    return Some(format!(
                        "The current balance is {} {}.",
                        scalar_text(balance),
                        currency(result)
                    ));
                }
            }
            Some("get_customer_info") => {
                if let Some(summary) = customer_info_line(result) {
                    return Some(summary);
                }
            }
            _ => {}
        }
    }

    match map.get("llm_output") {
        Some(Value::String(s)) => {
            if let Some(found) =
                try_parse_json(s).and_then(|inner| extract_at(&inner, depth + 1))
            {
                return Some(found);
            }
        }
        Some(nested @ Value::Object(_)) => {
            if let Some(found) = extract_at(nested, depth + 1) {
                return Some(found);
            }
        }
        Some(Value::Array(items)) => {
            if let Some(found) = scan_json_strings(items.iter(), depth) {
                return Some(found);
            }
        }
        _ => {}
    }

    scan_json_strings(
        map.iter()
            .filter(|(key, _)| key.as_str() != "llm_output")
            .map(|(_, value)| value),
        depth,
    )
}

/// First string value that holds interpretable JSON, in order.
fn scan_json_strings<'a>(
    values: impl Iterator<Item = &'a Value>,
    depth: usize,
) -> Option<String> {
    values
        .filter_map(Value::as_str)
        .filter_map(try_parse_json)
        .find_map(|inner| extract_at(&inner, depth + 1))
}

fn customer_info_line(result: &Map<String, Value>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(name) = present(result, "name") {
        parts.push(format!("Name: {}", scalar_text(name)));
    }
    if let Some(account) = present(result, "account_id") {
        parts.push(format!("Account: {}", scalar_text(account)));
    }
    if let Some(balance) = present(result, "balance") {
        let line = format!("Balance: {} {}", scalar_text(balance), currency(result));
        parts.push(line.trim_end().to_owned());
    }
    if let Some(email) = present(result, "email") {
        parts.push(format!("Email: {}", scalar_text(email)));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(BULLET))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rendering helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Treat a message text as a structured payload when it holds a JSON
/// object or array.  Anything else is displayed literally.
pub fn parse_payload(text: &str) -> Option<Value> {
    try_parse_json(text).filter(|v| v.is_object() || v.is_array())
}

/// Display lines for the actions the client knows how to lay out.
///
/// Unlike [`extract_human_message`] this always produces a full block with
/// `N/A` / `—` for missing fields.
pub fn structured_summary(payload: &Value) -> Option<Vec<String>> {
    let action = payload.get("action").and_then(Value::as_str)?;
    let result = payload.get("action_result").and_then(Value::as_object)?;
    let field = |key: &str, missing: &str| {
        present(result, key)
            .map(scalar_text)
            .unwrap_or_else(|| missing.to_owned())
    };

    match action {
        "get_balance" => {
            let amount = format!("{} {}", field("balance", ""), currency(result));
            Some(vec![
                format!("Balance check for {}", field("customer_id", "—")),
                format!(
                    "The current balance is {} (status: {}).",
                    amount.trim(),
                    field("status", "—")
                ),
            ])
        }
        "get_customer_info" => {
            let balance = match present(result, "balance") {
                Some(b) => format!("{} {}", scalar_text(b), currency(result))
                    .trim_end()
                    .to_owned(),
                None => "N/A".to_owned(),
            };
            Some(vec![
                "Customer information".to_owned(),
                format!("Name: {}", field("name", "N/A")),
                format!("Account: {}", field("account_id", "N/A")),
                format!("Balance: {balance}"),
                format!("Email: {}", field("email", "N/A")),
                format!("Masked SSN: {}", field("masked_ssn", "N/A")),
            ])
        }
        _ => None,
    }
}

/// Pretty-printed JSON for raw display.
pub fn pretty(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Value helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn try_parse_json(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim()).ok()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// A field counts as present when it is non-null and, for strings, non-empty.
fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn currency(result: &Map<String, Value>) -> String {
    result.get("currency").map(scalar_text).unwrap_or_default()
}

/// Render a JSON value for inline display: strings without quotes, null as
/// empty, everything else in compact JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
