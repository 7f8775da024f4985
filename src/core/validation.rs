//! Cleanup and validation of check-in payloads sent by the workflow engine.

use serde_json::{Map, Value};

const STRING_FIELDS: [&str; 6] = ["name", "namn", "tag", "nick", "email", "discord"];
const PHONE_FIELDS: [&str; 3] = ["telephone", "telefon", "phone"];
const PERSONAL_ID_FIELDS: [&str; 2] = ["personnummer", "personal_id"];

fn max_length(field: &str) -> Option<usize> {
    match field {
        "name" | "namn" => Some(100),
        "telephone" | "telefon" | "phone" => Some(20),
        "personnummer" | "personal_id" => Some(12),
        "tag" | "nick" => Some(30),
        "email" => Some(254),
        "discord" => Some(50),
        _ => None,
    }
}

/// Trim and cap a text field at its maximum length (in characters).
pub fn sanitize_string(value: &str, field: &str) -> String {
    let trimmed = value.trim();
    match max_length(field) {
        Some(max) if trimmed.chars().count() > max => {
            log::warn!(
                "Field '{}' truncated from {} to {} chars",
                field,
                trimmed.chars().count(),
                max
            );
            trimmed.chars().take(max).collect()
        }
        _ => trimmed.to_string(),
    }
}

/// Keep only the digits of a phone number or personal id.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Map a "missing requirement" key, including legacy Swedish spellings, to its canonical key.
fn canonical_missing_key(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "startgg" | "start.gg" => "startgg".to_string(),
        "membership" | "medlemskap" | "member" => "membership".to_string(),
        "payment" | "betalning" | "swish" => "payment".to_string(),
        _ => key,
    }
}

/// Canonicalize and de-duplicate a list of missing requirement keys, keeping first-seen order.
pub fn normalize_missing_keys(missing: &[Value]) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for item in missing.iter().filter_map(Value::as_str) {
        let key = canonical_missing_key(item);
        if !key.is_empty() && !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

/// Return a cleaned copy of a check-in payload.
pub fn sanitize_checkin_payload(payload: &Map<String, Value>) -> Map<String, Value> {
    let mut out = payload.clone();

    for field in STRING_FIELDS {
        if let Some(Value::String(s)) = out.get(field) {
            let cleaned = sanitize_string(s, field);
            out.insert(field.to_string(), Value::String(cleaned));
        }
    }

    for field in PHONE_FIELDS.iter().chain(PERSONAL_ID_FIELDS.iter()) {
        if let Some(Value::String(s)) = out.get(*field) {
            let cleaned = digits_only(s);
            out.insert(field.to_string(), Value::String(cleaned));
        }
    }

    if let Some(Value::Array(legacy)) = out.get("saknas").cloned() {
        out.remove("saknas");
        out.insert("missing".to_string(), Value::Array(legacy));
    }
    if let Some(Value::Array(missing)) = out.get("missing") {
        let normalized = normalize_missing_keys(missing)
            .into_iter()
            .map(Value::String)
            .collect();
        out.insert("missing".to_string(), Value::Array(normalized));
    }

    out
}

fn has_text(payload: &Map<String, Value>, fields: &[&str]) -> bool {
    fields
        .iter()
        .any(|f| matches!(payload.get(*f), Some(Value::String(s)) if !s.trim().is_empty()))
}

fn present_text(payload: &Map<String, Value>, field: &str) -> Option<String> {
    match payload.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// A single problem with a payload, tied to the field that caused it.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        ValidationIssue {
            field,
            message: message.into(),
        }
    }
}

/// Validate a check-in payload, returning every problem found.
pub fn validate_checkin_payload(payload: &Map<String, Value>) -> Vec<ValidationIssue> {
    let mut issues = vec![];

    if !has_text(payload, &["name", "namn"]) {
        issues.push(ValidationIssue::new("name", "Name is required"));
    }

    if !has_text(payload, &["tag", "nick"]) {
        issues.push(ValidationIssue::new("tag", "Tag/gamertag is required"));
    }

    for field in PERSONAL_ID_FIELDS {
        if let Some(raw) = present_text(payload, field) {
            let digits = digits_only(&raw);
            if !digits.is_empty() && digits.len() != 10 && digits.len() != 12 {
                issues.push(ValidationIssue::new(
                    field,
                    format!(
                        "Invalid personal ID format (expected 10 or 12 digits, got {})",
                        digits.len()
                    ),
                ));
            }
        }
    }

    for field in PHONE_FIELDS {
        if let Some(raw) = present_text(payload, field) {
            let digits = digits_only(&raw);
            if !digits.is_empty() && digits.len() < 7 {
                issues.push(ValidationIssue::new(
                    field,
                    "Phone number too short (minimum 7 digits)",
                ));
            }
        }
    }

    issues
}
