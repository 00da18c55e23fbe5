use serde_json::Value;

/// Numeric reading of a raw value. Anything unreadable is `NaN`.
///
/// Follows the usual loose-JSON conventions: blank strings and `null` read as
/// zero, booleans as one/zero, a single-element array as its element.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric(s),
        Value::Array(xs) => match xs.as_slice() {
            [] => 0.0,
            // a singleton reads as its element's text: `[true]` is "true", not 1
            [Value::Bool(_) | Value::Object(_)] => f64::NAN,
            [x] => to_number(x),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

/// Only JSON numbers are numeric.
pub fn strict_number(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

pub fn parse_numeric(src: &str) -> f64 {
    let s = src.trim();
    if s.is_empty() {
        return 0.0;
    }
    if let Some(n) = parse_radix(s) {
        return n;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // `str::parse` also takes "inf", "nan" and friends; those are not numbers here.
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(s: &str) -> Option<f64> {
    let (radix, digits) = match s.get(..2)? {
        "0x" | "0X" => (16, &s[2..]),
        "0o" | "0O" => (8, &s[2..]),
        "0b" | "0B" => (2, &s[2..]),
        _ => return None,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(f64::NAN);
    }
    let n = match u128::from_str_radix(digits, radix) {
        Ok(n) => n as f64,
        // too wide for u128: fold the digits as a float
        Err(_) => digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings() {
        assert_eq!(to_number(&json!("7")), 7.0);
        assert_eq!(to_number(&json!("  -2.5e1 ")), -25.0);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&json!("0x1A")), 26.0);
        assert_eq!(to_number(&json!("-Infinity")), f64::NEG_INFINITY);
    }

    #[test]
    fn non_numeric_is_nan() {
        assert!(to_number(&json!("seven")).is_nan());
        assert!(to_number(&json!("inf")).is_nan());
        assert!(to_number(&json!("0xZZ")).is_nan());
        assert!(to_number(&json!({"a": 1})).is_nan());
        assert!(to_number(&json!([1, 2])).is_nan());
    }

    #[test]
    fn strict_reads_json_numbers_only() {
        assert_eq!(strict_number(&json!(5)), 5.0);
        assert!(strict_number(&json!("7")).is_nan());
        assert!(strict_number(&json!(null)).is_nan());
    }

    #[test]
    fn scalars_and_singletons() {
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!(null)), 0.0);
        assert_eq!(to_number(&json!([])), 0.0);
        assert_eq!(to_number(&json!(["4"])), 4.0);
        assert_eq!(to_number(&json!([[4]])), 4.0);
        assert_eq!(to_number(&json!([[[]]])), 0.0);
        assert!(to_number(&json!([[1, 2]])).is_nan());
        assert!(to_number(&json!([true])).is_nan());
    }

    #[test]
    fn wide_radix_literals_stay_finite() {
        let wide = format!("0x{}", "f".repeat(40));
        let n = to_number(&Value::String(wide));
        assert!(n.is_finite());
        assert_eq!(n, 2f64.powi(160));
        assert!(to_number(&json!("0x")).is_nan());
        assert!(to_number(&json!("0b102")).is_nan());
    }
}
