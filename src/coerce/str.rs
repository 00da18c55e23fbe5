use serde_json::Value;

/// String reading of a raw value. Containers render as compact JSON.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                // f64's Display drops a zero fraction: 5.0 -> "5"
                n.as_f64().map(format_f64).unwrap_or_else(|| n.to_string())
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_owned(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn format_f64(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_owned()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() }
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(to_display(&json!(55)), "55");
        assert_eq!(to_display(&json!(5.0)), "5");
        assert_eq!(to_display(&json!(2.5)), "2.5");
        assert_eq!(to_display(&json!(false)), "false");
        assert_eq!(to_display(&json!("x")), "x");
    }

    #[test]
    fn containers_as_compact_json() {
        assert_eq!(to_display(&json!([1, "a"])), r#"[1,"a"]"#);
        assert_eq!(to_display(&json!({"k": null})), r#"{"k":null}"#);
    }
}
