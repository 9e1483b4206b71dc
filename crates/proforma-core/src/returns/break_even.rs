use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

fn default_days_per_month() -> Decimal {
    dec!(30.5)
}

/// Occupancy reported when no occupancy can cover costs.
pub const CANNOT_BREAK_EVEN: Rate = Decimal::ONE;

const SENSITIVITY_SHOCK: Decimal = dec!(0.10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenInput {
    pub room_count: u32,
    pub adr: Money,
    #[serde(default = "default_days_per_month")]
    pub days_per_month: Decimal,
    /// Ancillary revenue as a share of room revenue
    #[serde(default)]
    pub ancillary_pct: Rate,
    /// Operating costs that scale with revenue
    pub variable_cost_rate: Rate,
    pub management_fee_rate: Rate,
    pub ffe_reserve_rate: Rate,
    /// Monthly costs independent of occupancy
    pub fixed_costs: Money,
    /// Monthly debt service for the cash-flow variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_debt_service: Option<Money>,
    /// Monthly income tax estimate for the cash-flow variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_tax_estimate: Option<Money>,
    /// Used for margin of safety and break-even ADR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_occupancy: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenSensitivity {
    pub adr_down_10pct: Rate,
    pub fixed_costs_up_10pct: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenOutput {
    /// 1 − variable cost rate − management fee − FF&E reserve
    pub contribution_margin: Rate,
    /// Occupancy at which NOI is zero
    pub break_even_occupancy: Rate,
    /// Occupancy covering NOI, debt service and tax
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_flow_break_even_occupancy: Option<Rate>,
    pub cannot_break_even: bool,
    pub sensitivity: BreakEvenSensitivity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_adr: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_of_safety: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Closed-form break-even occupancy:
/// `fixed / (rooms × ADR × days × (1 + ancillary) × contribution margin)`,
/// clamped to [0, 1].
pub fn calculate_break_even(
    input: &BreakEvenInput,
) -> ProformaResult<ComputationOutput<BreakEvenOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.fixed_costs < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "fixed_costs".into(),
            reason: "Fixed costs cannot be negative".into(),
        });
    }
    if input.days_per_month <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "days_per_month".into(),
            reason: "Days per month must be positive".into(),
        });
    }

    let cm = contribution_margin(input);
    let cannot_break_even = cm <= Decimal::ZERO;
    if cannot_break_even {
        tracing::warn!(contribution_margin = %cm, "cannot break even");
        warnings.push(format!(
            "Contribution margin {cm} is not positive; break-even reported as 100% occupancy"
        ));
    }

    let full_revenue = full_occupancy_revenue(input, input.adr);
    let break_even_occupancy = solve(input.fixed_costs, full_revenue, cm);
    if break_even_occupancy == CANNOT_BREAK_EVEN && !cannot_break_even {
        warnings.push("Fixed costs exceed contribution at full occupancy".into());
    }

    let cash_flow_break_even_occupancy =
        if input.monthly_debt_service.is_some() || input.monthly_tax_estimate.is_some() {
            let burden = input.fixed_costs
                + input.monthly_debt_service.unwrap_or_default()
                + input.monthly_tax_estimate.unwrap_or_default();
            Some(solve(burden, full_revenue, cm))
        } else {
            None
        };

    let sensitivity = BreakEvenSensitivity {
        adr_down_10pct: solve(
            input.fixed_costs,
            full_occupancy_revenue(input, input.adr * (Decimal::ONE - SENSITIVITY_SHOCK)),
            cm,
        ),
        fixed_costs_up_10pct: solve(
            input.fixed_costs * (Decimal::ONE + SENSITIVITY_SHOCK),
            full_revenue,
            cm,
        ),
    };

    let (break_even_adr, margin_of_safety) = match input.current_occupancy {
        Some(occ) if occ > Decimal::ZERO => {
            let denom = Decimal::from(input.room_count)
                * input.days_per_month
                * occ
                * (Decimal::ONE + input.ancillary_pct)
                * cm;
            let adr = if denom > Decimal::ZERO {
                Some(input.fixed_costs / denom)
            } else {
                None
            };
            (adr, Some(occ - break_even_occupancy))
        }
        Some(_) => (None, Some(-break_even_occupancy)),
        None => (None, None),
    };

    let output = BreakEvenOutput {
        contribution_margin: cm,
        break_even_occupancy,
        cash_flow_break_even_occupancy,
        cannot_break_even,
        sensitivity,
        break_even_adr,
        margin_of_safety,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Break-Even Occupancy (closed form)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub fn contribution_margin(input: &BreakEvenInput) -> Rate {
    Decimal::ONE - input.variable_cost_rate - input.management_fee_rate - input.ffe_reserve_rate
}

/// Monthly revenue at 100% occupancy, ancillaries included.
fn full_occupancy_revenue(input: &BreakEvenInput, adr: Money) -> Money {
    Decimal::from(input.room_count)
        * adr
        * input.days_per_month
        * (Decimal::ONE + input.ancillary_pct)
}

fn solve(costs: Money, full_revenue: Money, cm: Rate) -> Rate {
    let denom = full_revenue * cm;
    if cm <= Decimal::ZERO || denom <= Decimal::ZERO {
        return CANNOT_BREAK_EVEN;
    }
    (costs / denom).max(Decimal::ZERO).min(Decimal::ONE)
}
