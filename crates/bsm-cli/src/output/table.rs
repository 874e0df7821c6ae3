use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_object, position_rows, row_headers, scalar_text};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_field_table(map),
        },
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            // Position rows get their own table below the summary
            let summary: Map<String, Value> = res_map
                .iter()
                .filter(|(k, _)| k.as_str() != "results")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            print_field_table(&summary);
            if let Some(rows) = position_rows(result) {
                println!();
                print_rows_table(rows);
            }
        }
        _ => println!("{}", result),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_object(map) {
        builder.push_record([key, scalar_text(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows_table(items: &[Value]) {
    let rows: Vec<Vec<(String, Value)>> = items
        .iter()
        .filter_map(Value::as_object)
        .map(flatten_object)
        .collect();
    if rows.is_empty() {
        println!("(no positions)");
        return;
    }

    let headers = row_headers(&rows);
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in &rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| scalar_text(v))
                    .unwrap_or_default()
            })
            .collect();
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}
