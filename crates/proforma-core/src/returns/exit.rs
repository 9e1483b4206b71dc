use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::proforma::assumptions::ExitAssumptions;
use crate::proforma::simulator::PropertyProjection;
use crate::rounding::{round, RoundingPolicy};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitValuationInput {
    /// Annual NOI the buyer underwrites
    pub stabilized_noi: Money,
    pub exit_cap_rate: Rate,
    pub sales_commission_rate: Rate,
    #[serde(default)]
    pub closing_cost_rate: Rate,
    #[serde(default)]
    pub outstanding_debt: Money,
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

impl ExitValuationInput {
    /// Exit at the horizon: final model-year NOI and ending debt.
    pub fn from_projection(
        projection: &PropertyProjection,
        exit: &ExitAssumptions,
        rounding: RoundingPolicy,
    ) -> Self {
        let last_year = projection.annual.last();
        Self {
            stabilized_noi: last_year.map(|y| y.noi).unwrap_or_default(),
            exit_cap_rate: exit.exit_cap_rate,
            sales_commission_rate: exit.sales_commission_rate,
            closing_cost_rate: exit.closing_cost_rate,
            outstanding_debt: projection.summary.ending_debt,
            rounding,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitValuationOutput {
    pub gross_sale_price: Money,
    pub sales_commission: Money,
    pub closing_costs: Money,
    pub debt_repayment: Money,
    /// Proceeds to equity after costs and debt
    pub net_proceeds: Money,
    pub is_debt_free_at_exit: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Direct-capitalisation sale price less selling costs and debt payoff.
pub fn calculate_exit_valuation(
    input: &ExitValuationInput,
) -> ProformaResult<ComputationOutput<ExitValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.outstanding_debt < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "outstanding_debt".into(),
            reason: "Outstanding debt cannot be negative".into(),
        });
    }
    if input.exit_cap_rate <= Decimal::ZERO {
        warnings.push("Exit cap rate is not positive; gross sale price set to zero".into());
    }
    if input.stabilized_noi < Decimal::ZERO {
        warnings.push("Stabilized NOI is negative".into());
    }

    let output = exit_valuation(input);
    if !output.is_debt_free_at_exit {
        warnings.push(format!(
            "Sale proceeds do not cover outstanding debt; shortfall {}",
            -output.net_proceeds
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Exit Valuation (direct capitalisation)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub fn exit_valuation(input: &ExitValuationInput) -> ExitValuationOutput {
    let policy = &input.rounding;
    let gross_sale_price = if input.exit_cap_rate > Decimal::ZERO {
        round(input.stabilized_noi / input.exit_cap_rate, policy)
    } else {
        Decimal::ZERO
    };
    let sales_commission = round(gross_sale_price * input.sales_commission_rate, policy);
    let closing_costs = round(gross_sale_price * input.closing_cost_rate, policy);
    let net_proceeds =
        gross_sale_price - sales_commission - closing_costs - input.outstanding_debt;

    ExitValuationOutput {
        gross_sale_price,
        sales_commission,
        closing_costs,
        debt_repayment: input.outstanding_debt,
        net_proceeds,
        is_debt_free_at_exit: net_proceeds >= Decimal::ZERO,
    }
}
