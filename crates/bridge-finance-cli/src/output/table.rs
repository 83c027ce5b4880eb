use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, sensitivity_grid};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                println!("{}", field_value_table(map));
            }
        }
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    if let Some((rows, cols, cells)) = sensitivity_grid(result) {
        println!("{}", grid_table(&rows, &cols, &cells));
        if let Some(base) = result.get("base_case_value") {
            println!("\nBase case: {}", format_scalar(base));
        }
        return;
    }

    let Value::Object(res_map) = result else {
        println!("{}", format_scalar(result));
        return;
    };

    // Scalars first, then any list of records (e.g. breakdown lines) as its own table
    let scalars: Map<String, Value> = res_map
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !scalars.is_empty() {
        println!("{}", field_value_table(&scalars));
    }

    for (key, val) in res_map {
        match val {
            Value::Array(records) if records.iter().all(Value::is_object) && !records.is_empty() => {
                println!("\n{}:", key);
                println!("{}", records_table(records));
            }
            Value::Object(nested) => {
                println!("\n{}:", key);
                println!("{}", field_value_table(nested));
            }
            _ => {}
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn field_value_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), format_scalar(val)]);
    }
    builder.build()
}

fn records_table(records: &[Value]) -> Table {
    let headers: Vec<String> = records
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    builder.build()
}

fn grid_table(rows: &[String], cols: &[String], cells: &[Vec<String>]) -> Table {
    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(cols.iter().cloned());
    builder.push_record(header);

    for (label, row) in rows.iter().zip(cells) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().cloned());
        builder.push_record(record);
    }
    builder.build()
}
