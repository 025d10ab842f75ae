use serde_json::{Map, Value};
use std::io;

/// Row arrays exported as their own CSV when present in the result,
/// checked in order.
const ROW_ARRAYS: [&str; 4] = ["cash_flows", "lines", "rows", "results"];

/// Write output as CSV to stdout. A result carrying a row array (cash flows,
/// equipment lines, tornado rows, scenario results) is written as that table;
/// anything else as flattened `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            match result {
                Value::Object(fields) => match find_rows(fields) {
                    Some(rows) => write_array_csv(&mut wtr, rows),
                    None => {
                        let _ = wtr.write_record(["field", "value"]);
                        let mut flat = Vec::new();
                        flatten("", result, &mut flat);
                        for (key, val) in flat {
                            let _ = wtr.write_record([key.as_str(), val.as_str()]);
                        }
                    }
                },
                Value::Array(arr) => write_array_csv(&mut wtr, arr),
                _ => {
                    let _ = wtr.write_record([&format_csv_value(result)]);
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn find_rows(fields: &Map<String, Value>) -> Option<&Vec<Value>> {
    ROW_ARRAYS.iter().find_map(|key| match fields.get(*key) {
        Some(Value::Array(rows)) if rows.iter().all(Value::is_object) && !rows.is_empty() => Some(rows),
        _ => None,
    })
}

/// Dotted paths for every leaf; arrays of objects are left as JSON.
fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, val, out);
            }
        }
        _ => out.push((prefix.to_string(), format_csv_value(value))),
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_result() {
        let mut out = Vec::new();
        flatten("", &json!({ "a": { "b": "1", "c": null }, "d": true }), &mut out);
        assert_eq!(
            out,
            vec![
                ("a.b".to_string(), "1".to_string()),
                ("a.c".to_string(), String::new()),
                ("d".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_find_rows_skips_scalar_arrays() {
        let value = json!({ "rows": ["x"], "cash_flows": [{ "year": 0 }] });
        let rows = find_rows(value.as_object().unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
