use colored::Colorize;
use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{envelope, envelope_warnings};

/// Format output as tables: scalar result fields first, then one table per
/// array of records (monthly rows, checks, findings, gates).
pub fn print_table(value: &Value) {
    if let Some(map) = envelope(value) {
        if let Some(result) = map.get("result") {
            print_result_table(result, map);
            return;
        }
    }
    match value {
        Value::Object(_) => print_flat_object(value),
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        let mut tables = Vec::new();
        for (key, val) in res_map {
            match val {
                Value::Array(rows) if rows.iter().any(Value::is_object) => {
                    tables.push((key, rows));
                }
                _ => builder.push_record([key.as_str(), &format_value(val)]),
            }
        }
        println!("{}", Table::from(builder));
        for (key, rows) in tables {
            println!("\n{}:", key.bold());
            print_array_table(rows);
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    let mut warnings = envelope_warnings(envelope).peekable();
    if warnings.peek().is_some() {
        println!("\n{}", "Warnings:".yellow());
        for w in warnings {
            println!("  - {}", w);
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => match s.as_str() {
            "UNQUALIFIED" => s.green().to_string(),
            "QUALIFIED" => s.yellow().to_string(),
            "ADVERSE" => s.red().to_string(),
            _ => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
