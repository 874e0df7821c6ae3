use serde_json::Value;
use std::io;

use super::{flatten_object, position_rows, row_headers, scalar_text};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Portfolio output becomes one row per position; any other result becomes
/// two-column `field,value` rows with nested objects flattened.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);
    if let Some(rows) = position_rows(result) {
        write_rows(&mut wtr, rows);
    } else if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in flatten_object(map) {
            let _ = wtr.write_record([key.as_str(), &scalar_text(&val)]);
        }
    } else if let Value::Array(items) = result {
        write_rows(&mut wtr, items);
    } else {
        let _ = wtr.write_record([&scalar_text(result)]);
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut StdoutWriter<'_>, items: &[Value]) {
    let rows: Vec<Vec<(String, Value)>> = items
        .iter()
        .filter_map(Value::as_object)
        .map(flatten_object)
        .collect();
    if rows.is_empty() {
        return;
    }

    let headers = row_headers(&rows);
    let _ = wtr.write_record(&headers);
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
        let _ = wtr.write_record(&record);
    }
}
