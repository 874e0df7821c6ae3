use serde_json::Value;

use super::scalar_text;

/// Print just the headline number of a result.
///
/// WACC prints its display string, pricing prints the premium and a
/// portfolio prints its total value. Anything else falls back to the first
/// field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in ["display", "price"] {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", scalar_text(val));
                return;
            }
        }

        if let Some(total) = map.get("totals").and_then(|t| t.get("value")) {
            println!("{}", scalar_text(total));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar_text(val));
            return;
        }
    }

    println!("{}", scalar_text(result_obj));
}
