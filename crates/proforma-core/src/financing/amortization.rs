use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::rounding::{round, RoundingPolicy};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A level-payment, fully amortizing loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate; the monthly rate is annual / 12
    pub annual_rate: Rate,
    pub term_months: u32,
}

/// One month of an amortization schedule. `month` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub beginning_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// Input for a standalone amortization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub amortization_years: u32,
    /// Loan maturity in months when shorter than the amortization period;
    /// the outstanding balance is repaid as a balloon in that month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon_month: Option<u32>,
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub monthly_payment: Money,
    pub schedule: Vec<AmortizationRow>,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Balloon repaid in the final row, if the schedule was truncated
    pub balloon_payment: Money,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn monthly_rate(annual_rate: Rate) -> Rate {
    annual_rate / MONTHS_PER_YEAR
}

/// (1 + r)^n by repeated multiplication.
fn compound_factor(rate: Rate, periods: u32) -> Decimal {
    let mut compound = Decimal::ONE;
    for _ in 0..periods {
        compound *= Decimal::ONE + rate;
    }
    compound
}

/// Level monthly payment: P * r(1+r)^n / ((1+r)^n - 1).
///
/// Degrades to P / n at a zero rate and to 0 for a zero principal or term.
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_months: u32) -> Money {
    if principal.is_zero() || term_months == 0 {
        return Decimal::ZERO;
    }
    let r = monthly_rate(annual_rate);
    if r.is_zero() {
        return principal / Decimal::from(term_months);
    }
    let compound = compound_factor(r, term_months);
    principal * r * compound / (compound - Decimal::ONE)
}

/// Balance outstanding after `elapsed_months` level payments, by forward
/// simulation at full precision. Clamped at zero.
pub fn remaining_balance(
    principal: Money,
    annual_rate: Rate,
    term_months: u32,
    elapsed_months: u32,
) -> Money {
    if elapsed_months >= term_months {
        return Decimal::ZERO;
    }
    let r = monthly_rate(annual_rate);
    let payment = monthly_payment(principal, annual_rate, term_months);
    let mut balance = principal;
    for _ in 0..elapsed_months {
        let interest = balance * r;
        balance -= payment - interest;
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
    }
    balance
}

/// Rounded schedule for a level-payment loan. See [`LoanTerms::schedule`].
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Rate,
    term_months: u32,
    policy: &RoundingPolicy,
) -> Vec<AmortizationRow> {
    LoanTerms::new(principal, annual_rate, term_months).schedule(policy)
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
        }
    }

    pub fn payment(&self) -> Money {
        monthly_payment(self.principal, self.annual_rate, self.term_months)
    }

    pub fn balance_after(&self, elapsed_months: u32) -> Money {
        remaining_balance(
            self.principal,
            self.annual_rate,
            self.term_months,
            elapsed_months,
        )
    }

    /// Rounded schedule over the full term. Each month's interest is rounded
    /// on the rounded running balance, and the last row retires whatever is
    /// left, so principal payments sum to the original principal exactly.
    pub fn schedule(&self, policy: &RoundingPolicy) -> Vec<AmortizationRow> {
        let mut rows = Vec::with_capacity(self.term_months as usize);
        if self.principal <= Decimal::ZERO || self.term_months == 0 {
            return rows;
        }

        let r = monthly_rate(self.annual_rate);
        let level_payment = round(self.payment(), policy);
        let mut balance = round(self.principal, policy);

        for month in 1..=self.term_months {
            let beginning_balance = balance;
            let interest = round(beginning_balance * r, policy);
            let mut principal = (level_payment - interest).max(Decimal::ZERO);
            if month == self.term_months || principal > beginning_balance {
                principal = beginning_balance;
            }
            balance = beginning_balance - principal;
            rows.push(AmortizationRow {
                month,
                beginning_balance,
                payment: interest + principal,
                interest,
                principal,
                ending_balance: balance,
            });
            if balance.is_zero() {
                break;
            }
        }

        rows
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a rounded monthly amortization schedule, optionally truncated by a
/// balloon maturity.
pub fn build_amortization(
    input: &AmortizationInput,
) -> ProformaResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative".into(),
        });
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.amortization_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization period must be at least 1 year".into(),
        });
    }

    let loan = LoanTerms::new(
        input.principal,
        input.annual_rate,
        input.amortization_years * 12,
    );
    let mut schedule = amortization_schedule(
        loan.principal,
        loan.annual_rate,
        loan.term_months,
        &input.rounding,
    );
    let mut balloon_payment = Decimal::ZERO;

    if let Some(balloon) = input.balloon_month {
        if balloon == 0 {
            return Err(ProformaError::InvalidInput {
                field: "balloon_month".into(),
                reason: "Balloon month must be at least 1".into(),
            });
        }
        if (balloon as usize) < schedule.len() {
            schedule.truncate(balloon as usize);
            if let Some(last) = schedule.last_mut() {
                balloon_payment = last.ending_balance;
                last.principal += balloon_payment;
                last.payment += balloon_payment;
                last.ending_balance = Decimal::ZERO;
            }
        } else {
            warnings.push(format!(
                "Balloon month {balloon} is at or beyond full amortization; ignored"
            ));
        }
    }

    if input.principal.is_zero() {
        warnings.push("Zero principal: empty schedule".into());
    }

    let total_payments: Money = schedule.iter().map(|r| r.payment).sum();
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    let total_principal: Money = schedule.iter().map(|r| r.principal).sum();

    let output = AmortizationOutput {
        monthly_payment: round(loan.payment(), &input.rounding),
        schedule,
        total_payments,
        total_interest,
        total_principal,
        balloon_payment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-Payment Loan Amortization",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_30yr_standard() {
        // $750k at 6.5% over 30 years ≈ $4,740.51
        let pmt = monthly_payment(dec!(750000), dec!(0.065), 360);
        assert!((pmt - dec!(4740.51)).abs() < dec!(0.05), "got {pmt}");
    }

    #[test]
    fn test_payment_zero_principal() {
        assert_eq!(monthly_payment(Decimal::ZERO, dec!(0.07), 300), Decimal::ZERO);
    }

    #[test]
    fn test_payment_zero_rate_is_straight_line() {
        assert_eq!(monthly_payment(dec!(120000), Decimal::ZERO, 120), dec!(1000));
    }

    #[test]
    fn test_remaining_balance_endpoints() {
        let p = dec!(500000);
        assert_eq!(remaining_balance(p, dec!(0.06), 300, 0), p);
        assert_eq!(remaining_balance(p, dec!(0.06), 300, 300), Decimal::ZERO);
        let mid = remaining_balance(p, dec!(0.06), 300, 150);
        assert!(mid > Decimal::ZERO && mid < p);
    }

    #[test]
    fn test_schedule_retires_principal_exactly() {
        let loan = LoanTerms::new(dec!(1000000), dec!(0.075), 300);
        let rows = loan.schedule(&RoundingPolicy::default());
        assert_eq!(rows.len(), 300);
        let total: Money = rows.iter().map(|r| r.principal).sum();
        assert_eq!(total, dec!(1000000));
        assert_eq!(rows.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_first_month_split() {
        // 1,000,000 at 12% => 1% monthly interest on the opening balance
        let loan = LoanTerms::new(dec!(1000000), dec!(0.12), 360);
        let rows = loan.schedule(&RoundingPolicy::default());
        assert_eq!(rows[0].interest, dec!(10000));
        assert_eq!(rows[0].principal, rows[0].payment - dec!(10000));
    }

    #[test]
    fn test_schedule_matches_forward_balance() {
        let loan = LoanTerms::new(dec!(800000), dec!(0.065), 300);
        let rows = loan.schedule(&RoundingPolicy::default());
        let exact = loan.balance_after(60);
        assert!((rows[59].ending_balance - exact).abs() < dec!(1));
    }

    #[test]
    fn test_build_amortization_balloon() {
        let input = AmortizationInput {
            principal: dec!(1000000),
            annual_rate: dec!(0.06),
            amortization_years: 30,
            balloon_month: Some(120),
            rounding: RoundingPolicy::default(),
        };
        let out = build_amortization(&input).unwrap().result;
        assert_eq!(out.schedule.len(), 120);
        assert!(out.balloon_payment > dec!(800000));
        assert_eq!(out.total_principal, dec!(1000000));
        assert_eq!(out.schedule.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_build_amortization_rejects_zero_term() {
        let input = AmortizationInput {
            principal: dec!(1000),
            annual_rate: dec!(0.05),
            amortization_years: 0,
            balloon_month: None,
            rounding: RoundingPolicy::default(),
        };
        assert!(build_amortization(&input).is_err());
    }

    proptest! {
        #[test]
        fn principal_payments_sum_to_original(
            principal_cents in 0i64..500_000_000,
            rate_bps in 0i64..1500,
            years in 1u32..31,
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let loan = LoanTerms::new(principal, Decimal::new(rate_bps, 4), years * 12);
            let rows = loan.schedule(&RoundingPolicy::default());
            let total: Money = rows.iter().map(|r| r.principal).sum();
            prop_assert_eq!(total, principal);
        }

        #[test]
        fn zero_rate_payment_is_principal_over_term(
            principal_cents in 1i64..500_000_000,
            months in 1u32..481,
        ) {
            let principal = Decimal::new(principal_cents, 2);
            prop_assert_eq!(
                monthly_payment(principal, Decimal::ZERO, months),
                principal / Decimal::from(months)
            );
        }
    }
}
