use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::financing::amortization::AmortizationRow;
use crate::rounding::{within_tolerance, Tolerance};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ProformaResult;

fn default_schedule_tolerance() -> Tolerance {
    Tolerance::cents()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleReconciliationInput {
    pub expected: Vec<AmortizationRow>,
    pub actual: Vec<AmortizationRow>,
    #[serde(default = "default_schedule_tolerance")]
    pub tolerance: Tolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleField {
    Interest,
    Principal,
    Payment,
    EndingBalance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMismatch {
    pub month: u32,
    pub field: ScheduleField,
    pub expected: Money,
    pub actual: Money,
    pub difference: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleReconciliationReport {
    pub months_compared: usize,
    pub missing_from_actual: Vec<u32>,
    pub missing_from_expected: Vec<u32>,
    pub mismatches: Vec<ScheduleMismatch>,
    /// Largest |actual − expected| ending balance over compared months
    pub max_balance_drift: Money,
    /// Σ actual interest − Σ expected interest over compared months
    pub cumulative_interest_variance: Money,
    pub reconciled: bool,
}

/// Compare two amortization schedules month by month.
pub fn reconcile_schedule(
    input: &ScheduleReconciliationInput,
) -> ProformaResult<ComputationOutput<ScheduleReconciliationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let tol = &input.tolerance;

    let expected: BTreeMap<u32, &AmortizationRow> =
        input.expected.iter().map(|r| (r.month, r)).collect();
    let actual: BTreeMap<u32, &AmortizationRow> =
        input.actual.iter().map(|r| (r.month, r)).collect();

    let missing_from_actual: Vec<u32> =
        expected.keys().filter(|m| !actual.contains_key(m)).copied().collect();
    let missing_from_expected: Vec<u32> =
        actual.keys().filter(|m| !expected.contains_key(m)).copied().collect();

    let mut mismatches = Vec::new();
    let mut months_compared = 0;
    let mut max_balance_drift = Decimal::ZERO;
    let mut cumulative_interest_variance = Decimal::ZERO;

    for (month, exp) in &expected {
        let Some(act) = actual.get(month) else {
            continue;
        };
        months_compared += 1;

        let fields = [
            (ScheduleField::Interest, exp.interest, act.interest),
            (ScheduleField::Principal, exp.principal, act.principal),
            (ScheduleField::Payment, exp.payment, act.payment),
            (ScheduleField::EndingBalance, exp.ending_balance, act.ending_balance),
        ];
        for (field, e, a) in fields {
            if !within_tolerance(a, e, tol) {
                mismatches.push(ScheduleMismatch {
                    month: *month,
                    field,
                    expected: e,
                    actual: a,
                    difference: a - e,
                });
            }
        }

        max_balance_drift = max_balance_drift.max((act.ending_balance - exp.ending_balance).abs());
        cumulative_interest_variance += act.interest - exp.interest;
    }

    if !missing_from_actual.is_empty() || !missing_from_expected.is_empty() {
        warnings.push(format!(
            "{} months missing from actual, {} missing from expected",
            missing_from_actual.len(),
            missing_from_expected.len()
        ));
    }
    if months_compared == 0 {
        warnings.push("No overlapping months to compare".into());
    }

    let output = ScheduleReconciliationReport {
        months_compared,
        reconciled: mismatches.is_empty()
            && missing_from_actual.is_empty()
            && missing_from_expected.is_empty(),
        missing_from_actual,
        missing_from_expected,
        mismatches,
        max_balance_drift,
        cumulative_interest_variance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortization Schedule Reconciliation",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::amortization::amortization_schedule;
    use crate::rounding::RoundingPolicy;
    use rust_decimal_macros::dec;

    fn schedule() -> Vec<AmortizationRow> {
        amortization_schedule(dec!(500000), dec!(0.06), 120, &RoundingPolicy::default())
    }

    #[test]
    fn test_identical_schedules_reconcile() {
        let input = ScheduleReconciliationInput {
            expected: schedule(),
            actual: schedule(),
            tolerance: Tolerance::cents(),
        };
        let r = reconcile_schedule(&input).unwrap().result;
        assert!(r.reconciled);
        assert_eq!(r.months_compared, 120);
        assert_eq!(r.max_balance_drift, Decimal::ZERO);
    }

    #[test]
    fn test_drift_detected() {
        let mut actual = schedule();
        actual[10].interest += dec!(0.05);
        actual[10].ending_balance -= dec!(3);
        let input = ScheduleReconciliationInput {
            expected: schedule(),
            actual,
            tolerance: Tolerance::cents(),
        };
        let r = reconcile_schedule(&input).unwrap().result;
        assert!(!r.reconciled);
        assert_eq!(r.mismatches.len(), 2);
        assert_eq!(r.mismatches[0].month, 11);
        assert_eq!(r.max_balance_drift, dec!(3));
        assert_eq!(r.cumulative_interest_variance, dec!(0.05));
    }

    #[test]
    fn test_missing_months() {
        let mut actual = schedule();
        actual.truncate(100);
        let input = ScheduleReconciliationInput {
            expected: schedule(),
            actual,
            tolerance: Tolerance::cents(),
        };
        let out = reconcile_schedule(&input).unwrap();
        assert_eq!(out.result.missing_from_actual.len(), 20);
        assert_eq!(out.result.months_compared, 100);
        assert!(!out.result.reconciled);
        assert_eq!(out.warnings.len(), 1);
    }
}
