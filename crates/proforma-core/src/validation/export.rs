use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ProformaResult;

fn default_value_tolerance() -> Money {
    dec!(1)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One figure sampled from an export and the model value it should carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedValue {
    pub section: String,
    pub label: String,
    pub expected: Money,
    /// `None` when the value could not be found in the export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Money>,
    /// Absolute tolerance for this value; falls back to the input default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportVerificationInput {
    pub expected_sections: Vec<String>,
    pub actual_sections: Vec<String>,
    #[serde(default)]
    pub values: Vec<ExportedValue>,
    pub expected_years: u32,
    pub actual_years: u32,
    pub expected_properties: u32,
    pub actual_properties: u32,
    #[serde(default = "default_value_tolerance")]
    pub default_tolerance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueMismatch {
    pub section: String,
    pub label: String,
    pub expected: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Money>,
    pub tolerance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportVerificationReport {
    pub missing_sections: Vec<String>,
    pub unexpected_sections: Vec<String>,
    pub values_checked: usize,
    pub value_mismatches: Vec<ValueMismatch>,
    /// Σ |difference| over mismatched values found in the export
    pub total_value_drift: Money,
    pub year_count_matches: bool,
    pub property_count_matches: bool,
    pub passed: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare an exported workbook's structure and sampled figures against the
/// model it was produced from.
pub fn verify_export(
    input: &ExportVerificationInput,
) -> ProformaResult<ComputationOutput<ExportVerificationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let expected: BTreeSet<&str> = input.expected_sections.iter().map(|s| s.trim()).collect();
    let actual: BTreeSet<&str> = input.actual_sections.iter().map(|s| s.trim()).collect();

    let missing_sections: Vec<String> =
        expected.difference(&actual).map(|s| s.to_string()).collect();
    let unexpected_sections: Vec<String> =
        actual.difference(&expected).map(|s| s.to_string()).collect();
    if !unexpected_sections.is_empty() {
        warnings.push(format!(
            "{} sections present in the export but not expected",
            unexpected_sections.len()
        ));
    }

    let mut value_mismatches = Vec::new();
    for v in &input.values {
        let tolerance = v.tolerance.unwrap_or(input.default_tolerance).abs();
        let difference = v.actual.map(|a| a - v.expected);
        let ok = difference.is_some_and(|d| d.abs() <= tolerance);
        if !ok {
            value_mismatches.push(ValueMismatch {
                section: v.section.clone(),
                label: v.label.clone(),
                expected: v.expected,
                actual: v.actual,
                difference,
                tolerance,
            });
        }
    }
    if input.values.is_empty() {
        warnings.push("No sample values supplied; only structure verified".into());
    }

    let year_count_matches = input.expected_years == input.actual_years;
    let property_count_matches = input.expected_properties == input.actual_properties;

    // Unexpected extra sections do not fail the export on their own.
    let passed = missing_sections.is_empty()
        && value_mismatches.is_empty()
        && year_count_matches
        && property_count_matches;

    let output = ExportVerificationReport {
        missing_sections,
        unexpected_sections,
        values_checked: input.values.len(),
        total_value_drift: value_drift(&value_mismatches),
        value_mismatches,
        year_count_matches,
        property_count_matches,
        passed,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Export Verification",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn value_drift(mismatches: &[ValueMismatch]) -> Money {
    mismatches
        .iter()
        .filter_map(|m| m.difference)
        .map(|d| d.abs())
        .sum::<Decimal>()
}
