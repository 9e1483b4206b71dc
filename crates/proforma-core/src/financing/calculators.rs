use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ProformaResult;

use super::amortization::monthly_payment;

fn default_target_dscr() -> Multiple {
    dec!(1.25)
}

fn default_minimum_debt_yield() -> Rate {
    dec!(0.09)
}

fn default_rate_shocks_bps() -> Vec<i32> {
    vec![-100, -50, 0, 50, 100, 200]
}

fn default_noi_shocks() -> Vec<Rate> {
    vec![dec!(-0.20), dec!(-0.10), dec!(0), dec!(0.10)]
}

// ---------------------------------------------------------------------------
// DSCR
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrInput {
    /// Annual net operating income
    pub noi: Money,
    pub loan_amount: Money,
    pub annual_rate: Rate,
    pub amortization_years: u32,
    /// Appraised value, for LTV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<Money>,
    #[serde(default = "default_target_dscr")]
    pub target_dscr: Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrOutput {
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    /// NOI / annual debt service (0 when there is no debt service)
    pub dscr: Multiple,
    /// NOI / loan amount
    pub debt_yield: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ltv: Option<Rate>,
    /// Largest loan whose debt service the NOI covers at the target DSCR
    pub max_loan_at_target_dscr: Money,
    pub meets_target: bool,
}

/// Debt service coverage for a level-payment loan.
pub fn calculate_dscr(input: &DscrInput) -> ProformaResult<ComputationOutput<DscrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.amortization_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization period must be at least 1 year".into(),
        });
    }
    if input.target_dscr <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "target_dscr".into(),
            reason: "Target DSCR must be positive".into(),
        });
    }

    let term_months = input.amortization_years * 12;
    let payment = monthly_payment(input.loan_amount, input.annual_rate, term_months);
    let annual_debt_service = payment * dec!(12);

    let dscr = if annual_debt_service.is_zero() {
        warnings.push("No debt service: DSCR reported as 0".into());
        Decimal::ZERO
    } else {
        input.noi / annual_debt_service
    };

    let debt_yield = if input.loan_amount.is_zero() {
        Decimal::ZERO
    } else {
        input.noi / input.loan_amount
    };

    let ltv = match input.property_value {
        Some(v) if v > Decimal::ZERO => Some(input.loan_amount / v),
        Some(_) => {
            warnings.push("Property value is not positive; LTV omitted".into());
            None
        }
        None => None,
    };

    let max_loan_at_target_dscr = max_loan_for_payment(
        (input.noi / input.target_dscr / dec!(12)).max(Decimal::ZERO),
        input.annual_rate,
        term_months,
    );

    let meets_target = !annual_debt_service.is_zero() && dscr >= input.target_dscr;
    if !annual_debt_service.is_zero() && !meets_target {
        warnings.push(format!(
            "DSCR of {:.2}x is below the {:.2}x target",
            dscr, input.target_dscr
        ));
    }

    let output = DscrOutput {
        monthly_payment: payment,
        annual_debt_service,
        dscr,
        debt_yield,
        ltv,
        max_loan_at_target_dscr,
        meets_target,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt Service Coverage Ratio",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Principal that a given level monthly payment retires over `term_months`.
fn max_loan_for_payment(payment: Money, annual_rate: Rate, term_months: u32) -> Money {
    if term_months == 0 {
        return Decimal::ZERO;
    }
    let r = annual_rate / dec!(12);
    if r.is_zero() {
        return payment * Decimal::from(term_months);
    }
    let mut compound = Decimal::ONE;
    for _ in 0..term_months {
        compound *= Decimal::ONE + r;
    }
    payment * (compound - Decimal::ONE) / (r * compound)
}

// ---------------------------------------------------------------------------
// Debt yield
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtYieldInput {
    pub noi: Money,
    pub loan_amount: Money,
    #[serde(default = "default_minimum_debt_yield")]
    pub minimum_debt_yield: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtYieldOutput {
    pub debt_yield: Rate,
    pub max_loan_at_minimum: Money,
    pub meets_minimum: bool,
}

/// NOI / loan amount, and the largest loan sized to the lender's minimum.
pub fn calculate_debt_yield(
    input: &DebtYieldInput,
) -> ProformaResult<ComputationOutput<DebtYieldOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.minimum_debt_yield <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "minimum_debt_yield".into(),
            reason: "Minimum debt yield must be positive".into(),
        });
    }

    let debt_yield = if input.loan_amount.is_zero() {
        warnings.push("Zero loan amount: debt yield reported as 0".into());
        Decimal::ZERO
    } else {
        input.noi / input.loan_amount
    };

    let output = DebtYieldOutput {
        debt_yield,
        max_loan_at_minimum: (input.noi / input.minimum_debt_yield).max(Decimal::ZERO),
        meets_minimum: !input.loan_amount.is_zero() && debt_yield >= input.minimum_debt_yield,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata("Debt Yield", input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Rate / NOI sensitivity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingSensitivityInput {
    pub noi: Money,
    pub loan_amount: Money,
    pub annual_rate: Rate,
    pub amortization_years: u32,
    #[serde(default = "default_rate_shocks_bps")]
    pub rate_shocks_bps: Vec<i32>,
    #[serde(default = "default_noi_shocks")]
    pub noi_shocks: Vec<Rate>,
    #[serde(default = "default_target_dscr")]
    pub covenant_dscr: Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub rate_shock_bps: i32,
    pub noi_shock: Rate,
    pub interest_rate: Rate,
    pub noi: Money,
    pub annual_debt_service: Money,
    pub dscr: Multiple,
    pub breaches_covenant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingSensitivityOutput {
    pub cells: Vec<SensitivityCell>,
    pub worst_dscr: Multiple,
    pub breach_count: usize,
}

/// DSCR across a grid of interest-rate and NOI shocks.
pub fn run_financing_sensitivity(
    input: &FinancingSensitivityInput,
) -> ProformaResult<ComputationOutput<FinancingSensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.amortization_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization period must be at least 1 year".into(),
        });
    }
    if input.rate_shocks_bps.is_empty() || input.noi_shocks.is_empty() {
        return Err(ProformaError::InsufficientData(
            "At least one rate shock and one NOI shock are required".into(),
        ));
    }

    let term_months = input.amortization_years * 12;
    let mut cells = Vec::with_capacity(input.rate_shocks_bps.len() * input.noi_shocks.len());

    for &bps in &input.rate_shocks_bps {
        let interest_rate = input.annual_rate + Decimal::from(bps) / dec!(10000);
        if interest_rate < Decimal::ZERO {
            warnings.push(format!(
                "Rate shock {bps}bps gives a negative rate; floored at 0"
            ));
        }
        let interest_rate = interest_rate.max(Decimal::ZERO);
        let annual_debt_service =
            monthly_payment(input.loan_amount, interest_rate, term_months) * dec!(12);

        for &shock in &input.noi_shocks {
            let noi = input.noi * (Decimal::ONE + shock);
            let dscr = if annual_debt_service.is_zero() {
                Decimal::ZERO
            } else {
                noi / annual_debt_service
            };
            cells.push(SensitivityCell {
                rate_shock_bps: bps,
                noi_shock: shock,
                interest_rate,
                noi,
                annual_debt_service,
                dscr,
                breaches_covenant: !annual_debt_service.is_zero() && dscr < input.covenant_dscr,
            });
        }
    }

    let worst_dscr = cells
        .iter()
        .map(|c| c.dscr)
        .min()
        .unwrap_or(Decimal::ZERO);
    let breach_count = cells.iter().filter(|c| c.breaches_covenant).count();

    let output = FinancingSensitivityOutput {
        cells,
        worst_dscr,
        breach_count,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "DSCR Sensitivity (rate x NOI)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
