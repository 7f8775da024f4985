use serde_json::Value;

/// Glyph the dashboard renders for a satisfied requirement.
pub const SATISFIED_GLYPH: &str = "✓";

/// Collapse the record store's many spellings of "yes" into a single predicate.
///
/// Only `true`, the satisfied glyph and any casing of the string `"true"` count.
/// Everything else, including numbers, arrays, `null` and unknown strings, is `false`.
pub fn is_satisfied(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == SATISFIED_GLYPH || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Same as [`is_satisfied`] but for fields that may be missing entirely.
pub fn is_satisfied_opt(value: Option<&Value>) -> bool {
    value.is_some_and(is_satisfied)
}
