use proforma_core::financing::amortization::{
    build_amortization, monthly_payment, AmortizationInput, LoanTerms,
};
use proforma_core::financing::calculators::{
    calculate_debt_yield, calculate_dscr, run_financing_sensitivity, DebtYieldInput, DscrInput,
    FinancingSensitivityInput,
};
use proforma_core::financing::prepayment::{
    calculate_prepayment, PrepaymentInput, PrepaymentPenalty,
};
use proforma_core::rounding::RoundingPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Amortization
// ===========================================================================

#[test]
fn test_payment_degenerate_cases() {
    assert_eq!(monthly_payment(dec!(0), dec!(0.07), 300), Decimal::ZERO);
    assert_eq!(monthly_payment(dec!(120000), dec!(0), 120), dec!(1000));
}

#[test]
fn test_schedule_retires_principal() {
    let out = build_amortization(&AmortizationInput {
        principal: dec!(2400000),
        annual_rate: dec!(0.065),
        amortization_years: 25,
        balloon_month: None,
        rounding: RoundingPolicy::default(),
    })
    .unwrap();
    let s = &out.result;
    assert_eq!(s.schedule.len(), 300);
    assert_eq!(s.total_principal, dec!(2400000));
    assert_eq!(s.schedule.last().unwrap().ending_balance, Decimal::ZERO);
    assert_eq!(s.total_payments, s.total_interest + s.total_principal);
    for pair in s.schedule.windows(2) {
        assert_eq!(pair[0].ending_balance, pair[1].beginning_balance);
    }
}

#[test]
fn test_balloon_repays_outstanding() {
    let out = build_amortization(&AmortizationInput {
        principal: dec!(1000000),
        annual_rate: dec!(0.06),
        amortization_years: 30,
        balloon_month: Some(120),
        rounding: RoundingPolicy::default(),
    })
    .unwrap()
    .result;
    assert_eq!(out.schedule.len(), 120);
    assert!(out.balloon_payment > dec!(800000));
    assert_eq!(out.total_principal, dec!(1000000));
}

#[test]
fn test_zero_amortization_years_rejected() {
    let r = build_amortization(&AmortizationInput {
        principal: dec!(1000),
        annual_rate: dec!(0.05),
        amortization_years: 0,
        balloon_month: None,
        rounding: RoundingPolicy::default(),
    });
    assert!(r.is_err());
}

// ===========================================================================
// Calculators
// ===========================================================================

#[test]
fn test_dscr_and_max_loan_consistent() {
    let out = calculate_dscr(&DscrInput {
        noi: dec!(300000),
        loan_amount: dec!(2400000),
        annual_rate: dec!(0.065),
        amortization_years: 25,
        property_value: Some(dec!(4000000)),
        target_dscr: dec!(1.25),
    })
    .unwrap()
    .result;
    assert_eq!(out.annual_debt_service, out.monthly_payment * dec!(12));
    assert_eq!(out.ltv, Some(dec!(0.6)));
    assert_eq!(out.debt_yield, dec!(0.125));
    // Sizing to the target and re-measuring lands on the target
    let ds = monthly_payment(out.max_loan_at_target_dscr, dec!(0.065), 300) * dec!(12);
    assert!((dec!(300000) / ds - dec!(1.25)).abs() < dec!(0.0001));
}

#[test]
fn test_debt_yield_below_minimum() {
    let out = calculate_debt_yield(&DebtYieldInput {
        noi: dec!(150000),
        loan_amount: dec!(2000000),
        minimum_debt_yield: dec!(0.10),
    })
    .unwrap()
    .result;
    assert_eq!(out.debt_yield, dec!(0.075));
    assert!(!out.meets_minimum);
    assert_eq!(out.max_loan_at_minimum, dec!(1500000));
}

#[test]
fn test_sensitivity_grid_shape() {
    let out = run_financing_sensitivity(&FinancingSensitivityInput {
        noi: dec!(300000),
        loan_amount: dec!(2400000),
        annual_rate: dec!(0.065),
        amortization_years: 25,
        rate_shocks_bps: vec![-100, 0, 100, 200],
        noi_shocks: vec![dec!(-0.2), dec!(0)],
        covenant_dscr: dec!(1.25),
    })
    .unwrap()
    .result;
    assert_eq!(out.cells.len(), 8);
    let worst = out.cells.iter().map(|c| c.dscr).min().unwrap();
    assert_eq!(out.worst_dscr, worst);
    assert_eq!(
        out.breach_count,
        out.cells.iter().filter(|c| c.breaches_covenant).count()
    );
}

#[test]
fn test_step_down_prepayment() {
    let loan = LoanTerms::new(dec!(1000000), dec!(0.06), 360);
    let out = calculate_prepayment(&PrepaymentInput {
        loan,
        elapsed_months: 30,
        penalty: PrepaymentPenalty::StepDown {
            schedule: vec![dec!(0.05), dec!(0.04), dec!(0.03)],
        },
        rounding: RoundingPolicy::default(),
    })
    .unwrap()
    .result;
    // Third loan year
    assert!((out.penalty_pct - dec!(0.03)).abs() < dec!(0.0001));
    assert_eq!(out.remaining_payments, 330);
    assert_eq!(out.total_payoff, out.outstanding_balance + out.penalty);
}
