use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::time_value::{irr, sign_changes};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrVectorInput {
    /// Equity contributed at acquisition, as a positive amount
    pub equity_investment: Money,
    /// Year index the investment is placed at
    pub acquisition_year: u32,
    /// Free cash flow to equity per year; its length is the horizon
    pub yearly_fcfe: Vec<Money>,
    #[serde(default)]
    pub refinancing_proceeds: Vec<Money>,
    #[serde(default)]
    pub exit_proceeds: Money,
    #[serde(default = "default_true")]
    pub include_exit: bool,
}

/// Conditions that make an IRR unreliable. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrrVectorWarning {
    AcquisitionOutsideHorizon { acquisition_year: u32, horizon: u32 },
    NoNegativeFlows,
    NoPositiveFlows,
    MultipleSignChanges { count: usize },
    NoExitProceeds,
}

impl fmt::Display for IrrVectorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrrVectorWarning::AcquisitionOutsideHorizon {
                acquisition_year,
                horizon,
            } => write!(
                f,
                "acquisition year {acquisition_year} is outside the {horizon}-year horizon; investment not placed"
            ),
            IrrVectorWarning::NoNegativeFlows => write!(f, "no negative cash flows: IRR undefined"),
            IrrVectorWarning::NoPositiveFlows => write!(f, "no positive cash flows: IRR undefined"),
            IrrVectorWarning::MultipleSignChanges { count } => {
                write!(f, "{count} sign changes: multiple IRRs possible")
            }
            IrrVectorWarning::NoExitProceeds => write!(f, "no exit proceeds in the final year"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrVectorValidation {
    pub is_valid: bool,
    pub has_negative: bool,
    pub has_positive: bool,
    pub sign_changes: usize,
    pub warnings: Vec<IrrVectorWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrVector {
    pub flows: Vec<Money>,
    pub validation: IrrVectorValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Assemble the equity cash-flow vector an IRR is computed on.
pub fn build_irr_vector(input: &IrrVectorInput) -> ProformaResult<ComputationOutput<IrrVector>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let vector = assemble(input);
    for w in &vector.validation.warnings {
        warnings.push(w.to_string());
    }
    if vector.validation.is_valid && vector.irr.is_none() {
        warnings.push("IRR did not converge".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equity IRR Cash-Flow Vector",
        input,
        warnings,
        elapsed,
        vector,
    ))
}

/// Vector, validation and IRR without the envelope.
pub fn assemble(input: &IrrVectorInput) -> IrrVector {
    let horizon = input.yearly_fcfe.len();
    let mut flows = input.yearly_fcfe.clone();
    let mut issues = Vec::new();

    for (year, proceeds) in input.refinancing_proceeds.iter().enumerate() {
        if let Some(flow) = flows.get_mut(year) {
            *flow += *proceeds;
        }
    }

    match flows.get_mut(input.acquisition_year as usize) {
        Some(flow) => *flow -= input.equity_investment.abs(),
        None => {
            tracing::warn!(
                acquisition_year = input.acquisition_year,
                horizon,
                "acquisition outside horizon"
            );
            issues.push(IrrVectorWarning::AcquisitionOutsideHorizon {
                acquisition_year: input.acquisition_year,
                horizon: horizon as u32,
            });
        }
    }

    let exit_included = input.include_exit && !input.exit_proceeds.is_zero();
    if exit_included {
        if let Some(last) = flows.last_mut() {
            *last += input.exit_proceeds;
        }
    }
    if !exit_included {
        issues.push(IrrVectorWarning::NoExitProceeds);
    }

    let validation = validate_flows(&flows, issues);
    let irr = if validation.is_valid {
        irr(&flows, dec!(0.1)).ok()
    } else {
        None
    };

    IrrVector {
        flows,
        validation,
        irr,
    }
}

/// Validity is at least one negative and one positive flow.
pub fn validate_flows(flows: &[Money], mut issues: Vec<IrrVectorWarning>) -> IrrVectorValidation {
    let has_negative = flows.iter().any(|f| *f < Decimal::ZERO);
    let has_positive = flows.iter().any(|f| *f > Decimal::ZERO);
    let changes = sign_changes(flows);

    if !has_negative {
        issues.push(IrrVectorWarning::NoNegativeFlows);
    }
    if !has_positive {
        issues.push(IrrVectorWarning::NoPositiveFlows);
    }
    if changes > 1 {
        issues.push(IrrVectorWarning::MultipleSignChanges { count: changes });
    }

    IrrVectorValidation {
        is_valid: has_negative && has_positive,
        has_negative,
        has_positive,
        sign_changes: changes,
        warnings: issues,
    }
}
