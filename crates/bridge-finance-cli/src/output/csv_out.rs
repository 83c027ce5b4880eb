use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{format_scalar, sensitivity_grid};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let _ = write_csv(&mut wtr, value);
    let _ = wtr.flush();
}

fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some((rows, cols, cells)) = sensitivity_grid(result) {
        let mut header = vec![String::new()];
        header.extend(cols);
        wtr.write_record(&header)?;
        for (label, row) in rows.into_iter().zip(cells) {
            let mut record = vec![label];
            record.extend(row);
            wtr.write_record(&record)?;
        }
        return Ok(());
    }

    match result {
        Value::Object(map) => match map.get("lines") {
            // Breakdown: one row per labelled metric
            Some(Value::Array(lines)) => write_records(wtr, lines),
            _ => write_field_value(wtr, map),
        },
        Value::Array(arr) => write_records(wtr, arr),
        _ => wtr.write_record([format_scalar(result)]),
    }
}

fn write_field_value<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_scalar(val)])?;
    }
    Ok(())
}

fn write_records<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([format_scalar(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
