//! Human-readable messages from the API's assorted error bodies.
//!
//! The backend answers failures with a bare string, an object carrying
//! `error`/`message`/`detail`/`non_field_errors`, a map of per-field
//! validation errors, or something that is not JSON at all.

use serde_json::{Map, Value};

const MAX_TEXT_CHARS: usize = 200;

/// Extract a message suitable for showing to a user from an error response.
///
/// `reason` is the status line's reason phrase, used when the body is empty.
#[must_use]
pub fn extract_error_message(status: u16, reason: &str, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => from_object(&map),
        Ok(Value::Array(items)) => join_strings(&items).unwrap_or_else(|| pretty(&Value::Array(items))),
        Ok(other) => other.to_string(),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                format!("Server error ({status}): {reason}")
            } else {
                let shown: String = text.chars().take(MAX_TEXT_CHARS).collect();
                format!("Server error ({status}): {shown}")
            }
        }
    }
}

fn from_object(map: &Map<String, Value>) -> String {
    match map.get("error") {
        Some(Value::String(s)) => return s.clone(),
        Some(nested @ (Value::Object(_) | Value::Array(_))) => return pretty(nested),
        _ => {}
    }
    for key in ["message", "detail"] {
        if let Some(Value::String(s)) = map.get(key) {
            return s.clone();
        }
    }
    match map.get("non_field_errors") {
        Some(Value::Array(items)) => {
            if let Some(joined) = join_strings(items) {
                return joined;
            }
        }
        Some(Value::String(s)) => return s.clone(),
        _ => {}
    }

    let fields: Vec<String> = map
        .iter()
        .filter_map(|(field, value)| match value {
            Value::Array(items) => Some(format!(
                "{field}: {}",
                join_strings(items).unwrap_or_else(|| value.to_string())
            )),
            Value::String(s) => Some(format!("{field}: {s}")),
            Value::Object(_) => Some(format!("{field}: {value}")),
            _ => None,
        })
        .collect();
    if fields.is_empty() {
        pretty(&Value::Object(map.clone()))
    } else {
        fields.join("\n")
    }
}

/// Join an array of strings with `", "`. `None` if any entry is not a string
/// or the array is empty.
fn join_strings(items: &[Value]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let parts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
    parts.map(|p| p.join(", "))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
