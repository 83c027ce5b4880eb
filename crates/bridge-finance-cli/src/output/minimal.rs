use serde_json::Value;

use super::format_scalar;

/// Fields reported by `--output minimal`, most important first.
const PRIORITY_KEYS: [&str; 4] = [
    "net_margin_after_financing",
    "base_case_value",
    "interest_share_pct",
    "total_financing_cost",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

/// Look for well-known result fields in priority order, then fall back to
/// the first field of the result object.
fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return format_scalar(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_scalar(val));
        }
    }

    format_scalar(result_obj)
}
