use serde_json::Value;

/// Headline values, most specific first. Paths are JSON pointers into the
/// result object.
const HEADLINE_PATHS: [&str; 8] = [
    "/ravs/total_score",
    "/total_score",
    "/unit_price",
    "/npv",
    "/payback_years",
    "/total_project_cost",
    "/peak_power_mw",
    "/version",
];

/// Print just the headline value of the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for path in HEADLINE_PATHS {
        if let Some(val) = result.pointer(path) {
            if !val.is_null() {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_prefers_quote_score() {
        let quote = json!({ "result": { "ravs": { "total_score": 81 }, "npv": "1" } });
        let result = quote.get("result").unwrap();
        let found = HEADLINE_PATHS.iter().find_map(|p| result.pointer(p));
        assert_eq!(found, Some(&json!(81)));
    }
}
