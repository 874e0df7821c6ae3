pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Lift nested objects into dotted keys (`pricing.delta`, `terms.d1`) so a
/// position row or a result with intermediate terms fits in one flat record.
pub(crate) fn flatten_object(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut fields = Vec::with_capacity(map.len());
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (sub_key, sub_val) in flatten_object(inner) {
                    fields.push((format!("{key}.{sub_key}"), sub_val));
                }
            }
            _ => fields.push((key.clone(), val.clone())),
        }
    }
    fields
}

/// Portfolio output carries one row per position under `results`.
pub(crate) fn position_rows(result: &Value) -> Option<&Vec<Value>> {
    match result.get("results") {
        Some(Value::Array(rows)) => Some(rows),
        _ => None,
    }
}

/// Union of flattened keys across rows, in first-seen order. Failed positions
/// have an `error` column and no `pricing.*` columns, so the first row alone
/// is not enough.
pub(crate) fn row_headers(rows: &[Vec<(String, Value)>]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
