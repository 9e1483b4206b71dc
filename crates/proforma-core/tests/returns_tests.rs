mod common;

use common::*;
use proforma_core::proforma::simulator::{simulate_property, SimulationInput};
use proforma_core::returns::break_even::{calculate_break_even, BreakEvenInput, CANNOT_BREAK_EVEN};
use proforma_core::returns::dcf::{calculate_dcf, DcfInput};
use proforma_core::returns::equity_multiple::{calculate_equity_multiple, EquityMultipleInput};
use proforma_core::returns::exit::{calculate_exit_valuation, ExitValuationInput};
use proforma_core::returns::irr_vector::{build_irr_vector, IrrVectorInput, IrrVectorWarning};
use proforma_core::rounding::RoundingPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn break_even_input() -> BreakEvenInput {
    BreakEvenInput {
        room_count: 20,
        adr: dec!(300),
        days_per_month: dec!(30.5),
        ancillary_pct: dec!(0),
        variable_cost_rate: dec!(0.35),
        management_fee_rate: dec!(0.05),
        ffe_reserve_rate: dec!(0.04),
        fixed_costs: dec!(50000),
        monthly_debt_service: None,
        monthly_tax_estimate: None,
        current_occupancy: None,
    }
}

// ===========================================================================
// Break-even
// ===========================================================================

#[test]
fn test_break_even_reference_case() {
    let out = calculate_break_even(&break_even_input()).unwrap().result;
    assert_eq!(out.contribution_margin, dec!(0.56));
    // 50000 / (20 × 300 × 30.5 × 0.56)
    assert!((out.break_even_occupancy - dec!(0.4879)).abs() < dec!(0.0001));
    assert!(out.sensitivity.adr_down_10pct > out.break_even_occupancy);
    assert!(out.sensitivity.fixed_costs_up_10pct > out.break_even_occupancy);
}

#[test]
fn test_break_even_sentinel() {
    let mut input = break_even_input();
    input.variable_cost_rate = dec!(0.95);
    let out = calculate_break_even(&input).unwrap();
    assert!(out.result.cannot_break_even);
    assert_eq!(out.result.break_even_occupancy, CANNOT_BREAK_EVEN);
    assert_eq!(out.result.break_even_occupancy, Decimal::ONE);
    assert!(!out.warnings.is_empty());
}

// ===========================================================================
// IRR vector / DCF / multiple
// ===========================================================================

#[test]
fn test_fcfe_vector_example() {
    let out = build_irr_vector(&IrrVectorInput {
        equity_investment: dec!(1000000),
        acquisition_year: 0,
        yearly_fcfe: vec![dec!(0), dec!(50000), dec!(60000), dec!(70000), dec!(0)],
        refinancing_proceeds: vec![],
        exit_proceeds: dec!(1200000),
        include_exit: true,
    })
    .unwrap()
    .result;
    assert_eq!(
        out.flows,
        vec![dec!(-1000000), dec!(50000), dec!(60000), dec!(70000), dec!(1200000)]
    );
    assert_eq!(out.validation.sign_changes, 1);
    assert!(out.validation.is_valid);
    assert!(out.irr.is_some());
}

#[test]
fn test_positive_only_vector() {
    let out = build_irr_vector(&IrrVectorInput {
        equity_investment: dec!(0),
        acquisition_year: 0,
        yearly_fcfe: vec![dec!(10), dec!(20)],
        refinancing_proceeds: vec![],
        exit_proceeds: dec!(0),
        include_exit: true,
    })
    .unwrap();
    assert!(!out.result.validation.is_valid);
    assert!(out
        .result
        .validation
        .warnings
        .contains(&IrrVectorWarning::NoNegativeFlows));
    assert!(out.warnings.iter().any(|w| w.contains("no negative cash flows")));
}

#[test]
fn test_dcf_confirms_its_own_irr() {
    let flows = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
    let first = calculate_dcf(&DcfInput {
        cash_flows: flows.clone(),
        discount_rate: dec!(0.08),
        candidate_irr: None,
        irr_tolerance: dec!(1),
    })
    .unwrap()
    .result;
    let irr = first.irr.unwrap();
    assert!(first.npv > Decimal::ZERO);

    let second = calculate_dcf(&DcfInput {
        cash_flows: flows,
        discount_rate: dec!(0.08),
        candidate_irr: Some(irr),
        irr_tolerance: dec!(1),
    })
    .unwrap()
    .result;
    assert!(second.candidate_check.unwrap().confirmed);
}

#[test]
fn test_equity_multiple() {
    let out = calculate_equity_multiple(&EquityMultipleInput {
        cash_flows: vec![dec!(-500), dec!(100), dec!(100), dec!(800)],
    })
    .unwrap()
    .result;
    assert_eq!(out.equity_multiple, dec!(2));
    assert_eq!(out.net_profit, dec!(500));
}

// ===========================================================================
// Projection → exit → IRR
// ===========================================================================

#[test]
fn test_projection_feeds_returns() {
    let property = inn();
    let p = simulate_property(&SimulationInput {
        global: global(),
        property: property.clone(),
    })
    .unwrap()
    .result;

    let exit = calculate_exit_valuation(&ExitValuationInput::from_projection(
        &p,
        &property.exit,
        RoundingPolicy::default(),
    ))
    .unwrap()
    .result;
    assert_eq!(exit.debt_repayment, p.summary.ending_debt);
    assert_eq!(
        exit.net_proceeds,
        exit.gross_sale_price - exit.sales_commission - exit.closing_costs - exit.debt_repayment
    );

    let vector = build_irr_vector(&IrrVectorInput {
        equity_investment: p.summary.paid_in_equity,
        acquisition_year: 0,
        yearly_fcfe: p.annual.iter().map(|a| a.cash_flow).collect(),
        refinancing_proceeds: vec![],
        exit_proceeds: exit.net_proceeds,
        include_exit: true,
    })
    .unwrap()
    .result;
    assert!(vector.validation.has_negative);
    assert!(vector.validation.has_positive);
}
