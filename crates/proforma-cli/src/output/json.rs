use serde_json::Value;

use super::{envelope, envelope_warnings};

/// Pretty-print JSON to stdout. Envelope warnings are also logged, so they
/// reach stderr under `-v` when stdout is piped into another tool.
pub fn print_json(value: &Value) {
    if let Some(map) = envelope(value) {
        let methodology = map.get("methodology").and_then(Value::as_str).unwrap_or("");
        for warning in envelope_warnings(map) {
            tracing::info!(methodology, warning, "computation warning");
        }
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}
