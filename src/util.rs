use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a multi-select column.
///
/// The record store sends an array when values are selected, omits the field or
/// sends `null` when none are, and older rows hold a comma-separated string.
pub fn deserialize_string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![],
    })
}

/// Deserialize a text column that is sometimes stored as a number (phone numbers,
/// Swish numbers). Numbers are rendered without a trailing `.0`.
pub fn deserialize_lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => {
            let text = n.to_string();
            Some(text.strip_suffix(".0").map(str::to_string).unwrap_or(text))
        }
        _ => None,
    })
}
