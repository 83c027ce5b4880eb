pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a scalar JSON value as plain text.
pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Row labels, column labels and cells of a sensitivity grid, if `result` is one.
pub(crate) fn sensitivity_grid(result: &Value) -> Option<(Vec<String>, Vec<String>, Vec<Vec<String>>)> {
    let matrix = result.get("matrix")?.as_array()?;
    let strings = |key: &str| -> Vec<String> {
        result
            .get(key)
            .and_then(Value::as_array)
            .map(|vals| vals.iter().map(format_scalar).collect())
            .unwrap_or_default()
    };

    let v1 = strings("variable_1_values");
    let v2 = strings("variable_2_values");
    let cells: Vec<Vec<String>> = matrix
        .iter()
        .map(|row| {
            row.as_array()
                .map(|r| r.iter().map(format_scalar).collect())
                .unwrap_or_default()
        })
        .collect();

    if v2.is_empty() {
        // One-way sweep: a single row keyed by the metric, columns are variable_1
        let metric = result
            .get("output_metric")
            .map(format_scalar)
            .unwrap_or_default();
        Some((vec![metric], v1, cells))
    } else {
        Some((v1, v2, cells))
    }
}
