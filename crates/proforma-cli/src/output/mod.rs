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

/// The fields of a computation envelope (`result` plus its metadata), or
/// `None` for any other JSON value.
pub(crate) fn envelope(value: &Value) -> Option<&Map<String, Value>> {
    value
        .as_object()
        .filter(|map| map.contains_key("result") && map.contains_key("metadata"))
}

/// Warning strings carried by an envelope.
pub(crate) fn envelope_warnings(map: &Map<String, Value>) -> impl Iterator<Item = &str> {
    map.get("warnings")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_detection_and_warnings() {
        let out = json!({
            "result": { "irr": "0.01" },
            "methodology": "Equity IRR Vector",
            "warnings": ["no exit proceeds in the final year"],
            "metadata": { "precision": "rust_decimal_128bit" },
        });
        let map = envelope(&out).unwrap();
        assert_eq!(
            envelope_warnings(map).collect::<Vec<_>>(),
            vec!["no exit proceeds in the final year"]
        );
        assert!(envelope(&json!({ "result": 1 })).is_none());
        assert!(envelope(&json!([1, 2])).is_none());
    }
}
