use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::audit::checks::Severity;
use crate::proforma::assumptions::{GlobalAssumptions, PropertyAssumptions};
use crate::types::{months_between, with_metadata, ComputationOutput, Rate};
use crate::ProformaResult;

const EXIT_CAP_RANGE: (Rate, Rate) = (dec!(0.03), dec!(0.15));
const INTEREST_RANGE: (Rate, Rate) = (dec!(0.02), dec!(0.15));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyInput {
    pub global: GlobalAssumptions,
    pub properties: Vec<PropertyAssumptions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingField,
    OutOfRange,
    TimingContradiction,
    DuplicateId,
    Reasonableness,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyFinding {
    pub kind: FindingKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub findings: Vec<ConsistencyFinding>,
    pub critical: usize,
    pub material: usize,
    pub warning: usize,
    pub info: usize,
    /// No critical and no material findings
    pub is_valid: bool,
}

struct Findings(Vec<ConsistencyFinding>);

impl Findings {
    fn push(
        &mut self,
        kind: FindingKind,
        severity: Severity,
        property: Option<&str>,
        field: &str,
        message: String,
    ) {
        self.0.push(ConsistencyFinding {
            kind,
            severity,
            property_id: property.map(str::to_string),
            field: field.to_string(),
            message,
        });
    }

    fn count(&self, severity: Severity) -> usize {
        self.0.iter().filter(|f| f.severity == severity).count()
    }
}

fn outside(value: Rate, (low, high): (Rate, Rate)) -> bool {
    value < low || value > high
}

/// Scan an assumption snapshot for missing values, implausible rates and
/// contradictory dates.
pub fn check_assumption_consistency(
    input: &ConsistencyInput,
) -> ProformaResult<ComputationOutput<ConsistencyReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let mut findings = Findings(Vec::new());
    let global = &input.global;

    if global.projection_years == 0 {
        findings.push(
            FindingKind::MissingField,
            Severity::Critical,
            None,
            "projection_years",
            "projection horizon is zero years".into(),
        );
    }
    for (field, rate) in [
        ("base_management_fee_rate", global.base_management_fee_rate),
        ("incentive_management_fee_rate", global.incentive_management_fee_rate),
    ] {
        if outside(rate, (Decimal::ZERO, Decimal::ONE)) {
            findings.push(
                FindingKind::OutOfRange,
                Severity::Material,
                None,
                field,
                format!("{field} {rate} is outside 0–100%"),
            );
        }
    }
    let default_rate = global.default_debt.interest_rate;
    if outside(default_rate, INTEREST_RANGE) {
        findings.push(
            FindingKind::OutOfRange,
            Severity::Material,
            None,
            "default_debt.interest_rate",
            format!("default interest rate {default_rate} is outside 2–15%"),
        );
    }
    if input.properties.is_empty() {
        warnings.push("No properties in snapshot".into());
    }

    let mut seen = HashSet::new();
    for p in &input.properties {
        let id = Some(p.id.as_str());

        if p.id.trim().is_empty() {
            findings.push(
                FindingKind::MissingField,
                Severity::Critical,
                None,
                "id",
                format!("property '{}' has no id", p.name),
            );
        } else if !seen.insert(p.id.as_str()) {
            findings.push(
                FindingKind::DuplicateId,
                Severity::Critical,
                id,
                "id",
                format!("property id '{}' appears more than once", p.id),
            );
        }

        let required = [
            ("room_count", p.room_count == 0, "room count is zero"),
            ("start_adr", p.start_adr <= Decimal::ZERO, "starting ADR is not positive"),
            ("purchase_price", p.purchase_price <= Decimal::ZERO, "purchase price is not positive"),
        ];
        for (field, missing, message) in required {
            if missing {
                findings.push(
                    FindingKind::MissingField,
                    Severity::Critical,
                    id,
                    field,
                    message.into(),
                );
            }
        }

        if p.start_occupancy > p.max_occupancy {
            findings.push(
                FindingKind::OutOfRange,
                Severity::Critical,
                id,
                "start_occupancy",
                format!(
                    "starting occupancy {} exceeds maximum {}",
                    p.start_occupancy, p.max_occupancy
                ),
            );
        }
        for (field, share) in [
            ("max_occupancy", p.max_occupancy),
            ("land_value_pct", p.land_value_pct),
        ] {
            if outside(share, (Decimal::ZERO, Decimal::ONE)) {
                findings.push(
                    FindingKind::OutOfRange,
                    Severity::Critical,
                    id,
                    field,
                    format!("{field} {share} is outside 0–100%"),
                );
            }
        }
        if outside(p.exit.exit_cap_rate, EXIT_CAP_RANGE) {
            findings.push(
                FindingKind::OutOfRange,
                Severity::Material,
                id,
                "exit.exit_cap_rate",
                format!("exit cap rate {} is outside 3–15%", p.exit.exit_cap_rate),
            );
        }
        if let Some(debt) = p.resolved_debt(global) {
            if outside(debt.interest_rate, INTEREST_RANGE) {
                findings.push(
                    FindingKind::OutOfRange,
                    Severity::Material,
                    id,
                    "financing.interest_rate",
                    format!("interest rate {} is outside 2–15%", debt.interest_rate),
                );
            }
            if debt.loan_amount > p.purchase_price {
                findings.push(
                    FindingKind::Reasonableness,
                    Severity::Warning,
                    id,
                    "financing.loan_amount",
                    format!(
                        "loan {} exceeds purchase price {}",
                        debt.loan_amount, p.purchase_price
                    ),
                );
            }
        }

        if let Some(refi) = p.refinance() {
            // The simulator gates refinancing by month, not by day.
            if months_between(p.acquisition_date, refi.date) <= 0 {
                findings.push(
                    FindingKind::TimingContradiction,
                    Severity::Critical,
                    id,
                    "financing.refinance.date",
                    format!(
                        "refinance date {} is not in a month after acquisition {}",
                        refi.date, p.acquisition_date
                    ),
                );
            }
            if outside(refi.interest_rate, INTEREST_RANGE) {
                findings.push(
                    FindingKind::OutOfRange,
                    Severity::Material,
                    id,
                    "financing.refinance.interest_rate",
                    format!("refinance rate {} is outside 2–15%", refi.interest_rate),
                );
            }
        }

        if months_between(global.model_start_date, p.operations_start_date) < 0 {
            findings.push(
                FindingKind::TimingContradiction,
                Severity::Material,
                id,
                "operations_start_date",
                format!(
                    "operations start {} before model start {}",
                    p.operations_start_date, global.model_start_date
                ),
            );
        }
        if p.adr_growth_rate < global.inflation_rate {
            findings.push(
                FindingKind::Reasonableness,
                Severity::Info,
                id,
                "adr_growth_rate",
                format!(
                    "ADR growth {} trails inflation {}",
                    p.adr_growth_rate, global.inflation_rate
                ),
            );
        }
    }

    let critical = findings.count(Severity::Critical);
    let material = findings.count(Severity::Material);
    let output = ConsistencyReport {
        critical,
        material,
        warning: findings.count(Severity::Warning),
        info: findings.count(Severity::Info),
        is_valid: critical == 0 && material == 0,
        findings: findings.0,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Assumption Consistency Scan",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proforma::assumptions::fixtures::*;
    use crate::proforma::assumptions::RefinanceTerms;
    use chrono::NaiveDate;

    fn run(properties: Vec<PropertyAssumptions>) -> ConsistencyReport {
        check_assumption_consistency(&ConsistencyInput {
            global: sample_global(),
            properties,
        })
        .unwrap()
        .result
    }

    #[test]
    fn test_sample_is_valid() {
        let r = run(vec![sample_property()]);
        assert!(r.is_valid, "{:?}", r.findings);
        assert_eq!(r.critical + r.material, 0);
    }

    #[test]
    fn test_exit_cap_out_of_range_is_material() {
        let mut p = sample_property();
        p.exit.exit_cap_rate = dec!(0.02);
        let r = run(vec![p]);
        assert!(!r.is_valid);
        assert_eq!(r.material, 1);
        assert_eq!(r.findings[0].field, "exit.exit_cap_rate");
    }

    #[test]
    fn test_start_occupancy_above_max_is_critical() {
        let mut p = sample_property();
        p.start_occupancy = dec!(0.9);
        let r = run(vec![p]);
        assert_eq!(r.critical, 1);
    }

    fn with_refinance_on(refinance_date: NaiveDate) -> PropertyAssumptions {
        let mut p = sample_property();
        if let Some(f) = p.financing.as_mut() {
            f.refinance = Some(RefinanceTerms {
                date: refinance_date,
                ltv: dec!(0.6),
                appraisal_cap_rate: dec!(0.08),
                interest_rate: dec!(0.06),
                amortization_years: 25,
            });
        }
        p
    }

    fn has_refinance_timing_finding(r: &ConsistencyReport) -> bool {
        r.findings.iter().any(|f| {
            f.kind == FindingKind::TimingContradiction
                && f.severity == Severity::Critical
                && f.field == "financing.refinance.date"
        })
    }

    #[test]
    fn test_refinance_before_acquisition() {
        let r = run(vec![with_refinance_on(date(2026, 1, 1))]);
        assert!(has_refinance_timing_finding(&r));
    }

    #[test]
    fn test_refinance_later_in_acquisition_month_is_critical() {
        // acquired 2026-01-15; the simulator ignores any refinance in month 0
        let r = run(vec![with_refinance_on(date(2026, 1, 28))]);
        assert!(has_refinance_timing_finding(&r));
        assert!(!r.is_valid);

        let r = run(vec![with_refinance_on(date(2027, 1, 1))]);
        assert!(!has_refinance_timing_finding(&r));
    }

    #[test]
    fn test_duplicate_ids_and_timing() {
        let mut b = sample_property();
        b.operations_start_date = date(2025, 6, 1);
        let r = run(vec![sample_property(), b]);
        assert!(r.findings.iter().any(|f| f.kind == FindingKind::DuplicateId));
        assert!(r
            .findings
            .iter()
            .any(|f| f.field == "operations_start_date" && f.severity == Severity::Material));
    }

    #[test]
    fn test_adr_growth_below_inflation_is_info_only() {
        let mut p = sample_property();
        p.adr_growth_rate = dec!(0.01);
        let r = run(vec![p]);
        assert_eq!(r.info, 1);
        assert!(r.is_valid);
    }
}
