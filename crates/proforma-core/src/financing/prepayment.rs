use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::rounding::{round, RoundingPolicy};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

use super::amortization::LoanTerms;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Prepayment penalty structure carried by the loan documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrepaymentPenalty {
    /// Remaining scheduled payments discounted at a spread over a reference
    /// (treasury) rate, less the outstanding balance. Floored at zero.
    YieldMaintenance { reference_rate: Rate, spread: Rate },
    /// Percentage of the outstanding balance keyed by elapsed loan year,
    /// e.g. [0.05, 0.04, 0.03, 0.02, 0.01]. Zero past the end of the schedule.
    StepDown { schedule: Vec<Rate> },
    /// Flat fee as a percentage of the outstanding balance.
    Defeasance { fee_rate: Rate },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentInput {
    pub loan: LoanTerms,
    /// Payments made before the prepayment date
    pub elapsed_months: u32,
    pub penalty: PrepaymentPenalty,
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentOutput {
    pub outstanding_balance: Money,
    pub remaining_payments: u32,
    pub monthly_payment: Money,
    pub penalty: Money,
    /// Penalty / outstanding balance
    pub penalty_pct: Rate,
    /// Balance plus penalty
    pub total_payoff: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price an early payoff under the given penalty structure.
pub fn calculate_prepayment(
    input: &PrepaymentInput,
) -> ProformaResult<ComputationOutput<PrepaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.loan.term_months == 0 {
        return Err(ProformaError::InvalidInput {
            field: "loan.term_months".into(),
            reason: "Loan term must be at least 1 month".into(),
        });
    }

    let policy = &input.rounding;
    let balance = round(input.loan.balance_after(input.elapsed_months), policy);
    let payment = input.loan.payment();
    let remaining = input.loan.term_months.saturating_sub(input.elapsed_months);

    if remaining == 0 {
        warnings.push("Prepayment at or after maturity: no balance outstanding".into());
    }

    let raw_penalty = match &input.penalty {
        PrepaymentPenalty::YieldMaintenance {
            reference_rate,
            spread,
        } => {
            let pv = present_value_of_payments(payment, *reference_rate + *spread, remaining);
            (pv - balance).max(Decimal::ZERO)
        }
        PrepaymentPenalty::StepDown { schedule } => {
            let loan_year = (input.elapsed_months / 12) as usize;
            let pct = schedule.get(loan_year).copied().unwrap_or_else(|| {
                if !schedule.is_empty() {
                    warnings.push(format!(
                        "Loan year {} is past the step-down schedule; no penalty applies",
                        loan_year + 1
                    ));
                }
                Decimal::ZERO
            });
            balance * pct
        }
        PrepaymentPenalty::Defeasance { fee_rate } => balance * fee_rate,
    };

    let penalty = round(raw_penalty, policy);
    let penalty_pct = if balance.is_zero() {
        Decimal::ZERO
    } else {
        penalty / balance
    };

    let output = PrepaymentOutput {
        outstanding_balance: balance,
        remaining_payments: remaining,
        monthly_payment: round(payment, policy),
        penalty,
        penalty_pct,
        total_payoff: balance + penalty,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan Prepayment Penalty",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// PV of `periods` level monthly payments at an annual discount rate.
fn present_value_of_payments(payment: Money, annual_rate: Rate, periods: u32) -> Money {
    let r = annual_rate / dec!(12);
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    for _ in 0..periods {
        discount *= Decimal::ONE + r;
        pv += payment / discount;
    }
    pv
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan() -> LoanTerms {
        LoanTerms::new(dec!(10000000), dec!(0.065), 360)
    }

    fn input(elapsed_months: u32, penalty: PrepaymentPenalty) -> PrepaymentInput {
        PrepaymentInput {
            loan: loan(),
            elapsed_months,
            penalty,
            rounding: RoundingPolicy::default(),
        }
    }

    #[test]
    fn test_step_down_by_loan_year() {
        let schedule = vec![dec!(0.05), dec!(0.04), dec!(0.03), dec!(0.02), dec!(0.01)];
        let out = calculate_prepayment(&input(
            30,
            PrepaymentPenalty::StepDown {
                schedule: schedule.clone(),
            },
        ))
        .unwrap()
        .result;
        // Month 30 falls in loan year 3 => 3%
        let expected = round(out.outstanding_balance * dec!(0.03), &RoundingPolicy::default());
        assert_eq!(out.penalty, expected);
    }

    #[test]
    fn test_step_down_past_schedule_is_free() {
        let out = calculate_prepayment(&input(
            84,
            PrepaymentPenalty::StepDown {
                schedule: vec![dec!(0.05), dec!(0.04)],
            },
        ))
        .unwrap();
        assert_eq!(out.result.penalty, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_defeasance_flat_fee() {
        let out = calculate_prepayment(&input(
            0,
            PrepaymentPenalty::Defeasance {
                fee_rate: dec!(0.01),
            },
        ))
        .unwrap()
        .result;
        assert_eq!(out.outstanding_balance, dec!(10000000));
        assert_eq!(out.penalty, dec!(100000));
        assert_eq!(out.total_payoff, dec!(10100000));
    }

    #[test]
    fn test_yield_maintenance_positive_when_rates_fall() {
        // Discounting at 3% + 0.5% < 6.5% note rate makes the remaining
        // payment stream worth more than the balance.
        let out = calculate_prepayment(&input(
            24,
            PrepaymentPenalty::YieldMaintenance {
                reference_rate: dec!(0.03),
                spread: dec!(0.005),
            },
        ))
        .unwrap()
        .result;
        assert!(out.penalty > Decimal::ZERO);
    }

    #[test]
    fn test_yield_maintenance_floored_when_rates_rise() {
        let out = calculate_prepayment(&input(
            24,
            PrepaymentPenalty::YieldMaintenance {
                reference_rate: dec!(0.08),
                spread: dec!(0.01),
            },
        ))
        .unwrap()
        .result;
        assert_eq!(out.penalty, Decimal::ZERO);
    }

    #[test]
    fn test_yield_maintenance_at_note_rate_is_near_zero() {
        let out = calculate_prepayment(&input(
            60,
            PrepaymentPenalty::YieldMaintenance {
                reference_rate: dec!(0.06),
                spread: dec!(0.005),
            },
        ))
        .unwrap()
        .result;
        assert!(out.penalty < dec!(1));
    }
}
