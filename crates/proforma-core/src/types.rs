use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ProformaError;
use crate::ProformaResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 1.8x equity multiple)
pub type Multiple = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Whole calendar months from `from` to `to` (negative when `to` is earlier).
/// Day-of-month is ignored: a date anywhere in a month counts as that month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
        - i64::from(from.month())
}

/// First day of the month `offset` months after the month containing `start`.
pub fn month_start(start: NaiveDate, offset: u32) -> ProformaResult<NaiveDate> {
    let first = start.with_day(1).ok_or_else(|| {
        ProformaError::DateError(format!("cannot take first of month for {start}"))
    })?;
    first.checked_add_months(Months::new(offset)).ok_or_else(|| {
        ProformaError::DateError(format!("{start} + {offset} months is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_between_ignores_day() {
        let a = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(months_between(a, b), 2);
        assert_eq!(months_between(b, a), -2);
    }

    #[test]
    fn test_month_start_rolls_year() {
        let a = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        assert_eq!(
            month_start(a, 3).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
        );
    }
}
