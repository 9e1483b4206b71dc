use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::time_value::{irr, npv, sign_changes};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

fn default_irr_tolerance() -> Money {
    dec!(1)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfInput {
    /// Periodic cash flows; index 0 is undiscounted
    pub cash_flows: Vec<Money>,
    pub discount_rate: Rate,
    /// IRR to confirm by checking NPV at that rate is ~0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_irr: Option<Rate>,
    /// Absolute NPV tolerance for the candidate check
    #[serde(default = "default_irr_tolerance")]
    pub irr_tolerance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountedFlow {
    pub period: u32,
    pub cash_flow: Money,
    pub discount_factor: Decimal,
    pub present_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateIrrCheck {
    pub candidate: Rate,
    pub npv_at_candidate: Money,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfOutput {
    pub flows: Vec<DiscountedFlow>,
    pub npv: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_check: Option<CandidateIrrCheck>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discount each flow at `cf_t / (1+r)^t`, sum to NPV, and optionally
/// confirm a candidate IRR.
pub fn calculate_dcf(input: &DcfInput) -> ProformaResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        return Err(ProformaError::InsufficientData(
            "DCF requires at least one cash flow".into(),
        ));
    }
    if input.discount_rate <= dec!(-1) {
        return Err(ProformaError::InvalidInput {
            field: "discount_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + input.discount_rate;
    let mut discount_factor = Decimal::ONE;
    let mut flows = Vec::with_capacity(input.cash_flows.len());
    for (t, cf) in input.cash_flows.iter().enumerate() {
        if t > 0 {
            discount_factor /= one_plus_r;
        }
        flows.push(DiscountedFlow {
            period: t as u32,
            cash_flow: *cf,
            discount_factor,
            present_value: *cf * discount_factor,
        });
    }
    let total_npv = npv(input.discount_rate, &input.cash_flows)?;

    let computed_irr = if sign_changes(&input.cash_flows) > 0 && input.cash_flows.len() > 1 {
        match irr(&input.cash_flows, input.discount_rate) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warnings.push(format!("IRR not computed: {e}"));
                None
            }
        }
    } else {
        warnings.push("Cash flows never change sign; IRR undefined".into());
        None
    };

    let candidate_check = match input.candidate_irr {
        Some(candidate) => {
            let at_candidate = npv(candidate, &input.cash_flows)?;
            let confirmed = at_candidate.abs() <= input.irr_tolerance;
            if !confirmed {
                warnings.push(format!(
                    "Candidate IRR {candidate} leaves NPV of {at_candidate}; not confirmed"
                ));
            }
            Some(CandidateIrrCheck {
                candidate,
                npv_at_candidate: at_candidate,
                confirmed,
            })
        }
        None => None,
    };

    let output = DcfOutput {
        flows,
        npv: total_npv,
        irr: computed_irr,
        candidate_check,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Discounted Cash Flow (NPV with IRR cross-check)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
