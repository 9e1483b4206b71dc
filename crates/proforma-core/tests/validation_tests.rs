mod common;

use common::*;
use proforma_core::audit::checks::{AuditOpinion, Severity};
use proforma_core::financing::amortization::amortization_schedule;
use proforma_core::proforma::simulator::{simulate_property, SimulationInput};
use proforma_core::rounding::{RoundingPolicy, Tolerance};
use proforma_core::validation::consistency::{check_assumption_consistency, ConsistencyInput};
use proforma_core::validation::export::{verify_export, ExportVerificationInput, ExportedValue};
use proforma_core::validation::funding_gates::{check_funding_gates, FundingGate, FundingGateInput};
use proforma_core::validation::identities::{validate_financial_identities, IdentityInput};
use proforma_core::validation::schedule::{reconcile_schedule, ScheduleReconciliationInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_every_simulated_month_passes_identities() {
    let p = simulate_property(&SimulationInput {
        global: global(),
        property: lodge(),
    })
    .unwrap()
    .result;
    let mut beginning = Decimal::ZERO;
    for r in &p.records {
        let report = validate_financial_identities(&IdentityInput::from_record(r, beginning))
            .unwrap()
            .result;
        assert_eq!(report.opinion, AuditOpinion::Unqualified);
        beginning = r.ending_cash;
    }
}

#[test]
fn test_all_cash_property_clears_debt_gate() {
    let property = lodge();
    let p = simulate_property(&SimulationInput {
        global: global(),
        property: property.clone(),
    })
    .unwrap()
    .result;
    let report = check_funding_gates(&FundingGateInput::from_projection(
        &p,
        property.acquisition_date,
        property.operations_start_date,
    ))
    .unwrap()
    .result;
    let debt_gate = report
        .gates
        .iter()
        .find(|g| g.gate == FundingGate::DebtRetiredAtExit)
        .unwrap();
    assert!(debt_gate.passed);
    assert_eq!(report.ending_debt, Some(Decimal::ZERO));
    let ops_gate = report
        .gates
        .iter()
        .find(|g| g.gate == FundingGate::OperationsAfterFunding)
        .unwrap();
    assert!(ops_gate.passed);
}

#[test]
fn test_engine_schedule_reconciles_against_itself_but_not_other_rate() {
    let policy = RoundingPolicy::default();
    let expected = amortization_schedule(dec!(2400000), dec!(0.065), 300, &policy);
    let same = reconcile_schedule(&ScheduleReconciliationInput {
        expected: expected.clone(),
        actual: amortization_schedule(dec!(2400000), dec!(0.065), 300, &policy),
        tolerance: Tolerance::cents(),
    })
    .unwrap()
    .result;
    assert!(same.reconciled);

    let other = reconcile_schedule(&ScheduleReconciliationInput {
        expected,
        actual: amortization_schedule(dec!(2400000), dec!(0.066), 300, &policy),
        tolerance: Tolerance::cents(),
    })
    .unwrap()
    .result;
    assert!(!other.reconciled);
    assert!(other.cumulative_interest_variance > Decimal::ZERO);
}

#[test]
fn test_consistency_over_portfolio() {
    let valid = check_assumption_consistency(&ConsistencyInput {
        global: global(),
        properties: vec![inn(), lodge()],
    })
    .unwrap()
    .result;
    assert!(valid.is_valid, "{:?}", valid.findings);

    let mut bad = lodge();
    bad.id = "inn-01".into();
    bad.exit.exit_cap_rate = dec!(0.2);
    let report = check_assumption_consistency(&ConsistencyInput {
        global: global(),
        properties: vec![inn(), bad],
    })
    .unwrap()
    .result;
    assert!(!report.is_valid);
    assert!(report.findings.iter().any(|f| f.severity == Severity::Critical));
    assert_eq!(report.material, 1);
}

#[test]
fn test_export_verification_reports_mismatch() {
    let out = verify_export(&ExportVerificationInput {
        expected_sections: vec!["Income Statement".into(), "Balance Sheet".into()],
        actual_sections: vec!["Income Statement".into(), "Balance Sheet".into()],
        values: vec![ExportedValue {
            section: "Income Statement".into(),
            label: "NOI".into(),
            expected: dec!(1000),
            actual: Some(dec!(1010)),
            tolerance: Some(dec!(5)),
        }],
        expected_years: 5,
        actual_years: 5,
        expected_properties: 2,
        actual_properties: 2,
        default_tolerance: dec!(1),
    })
    .unwrap()
    .result;
    assert!(!out.passed);
    assert_eq!(out.value_mismatches[0].difference, Some(dec!(10)));
    assert_eq!(out.total_value_drift, dec!(10));
}
