use serde_json::Value;

use super::truthy::is_satisfied;

/// Best-effort amount parser.
///
/// Accepts JSON numbers and strings using either `,` or `.` as the decimal
/// separator, ignoring whitespace (`" 25,50 "`, `"1 000"`). Anything that does not
/// parse to a finite number is `0`.
pub fn parse_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };

    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Amount a participant owes for the games they selected.
pub fn expected_payment<S: AsRef<str>>(games: &[S], price_per_game: &Value) -> f64 {
    games.len() as f64 * parse_amount(price_per_game)
}

/// Whether a participant's payment covers what they owe.
///
/// An operator approval (`explicit_valid_flag`) always wins. Otherwise the paid
/// amount must reach a strictly positive expected amount: a participant with
/// nothing expected (no games selected) is not considered paid until approved.
pub fn is_payment_sufficient(actual: &Value, expected: &Value, explicit_valid_flag: &Value) -> bool {
    if is_satisfied(explicit_valid_flag) {
        return true;
    }

    let expected = parse_amount(expected);
    expected > 0.0 && parse_amount(actual) >= expected
}
