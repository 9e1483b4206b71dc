use clap::Args;
use serde_json::Value;

use proforma_core::validation::consistency::{self, ConsistencyInput};
use proforma_core::validation::export::{self, ExportVerificationInput};
use proforma_core::validation::funding_gates::{self, FundingGateInput};
use proforma_core::validation::identities::{self, IdentityInput};
use proforma_core::validation::schedule::{self, ScheduleReconciliationInput};

use crate::input;

/// Path-only arguments shared by the validators
#[derive(Args)]
pub struct ValidatorArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_identities(args: ValidatorArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let id_input: IdentityInput = input::load(args.input.as_deref(), "identities")?;
    let result = identities::validate_financial_identities(&id_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_funding_gates(args: ValidatorArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fg_input: FundingGateInput = input::load(args.input.as_deref(), "funding-gates")?;
    let result = funding_gates::check_funding_gates(&fg_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_reconcile_schedule(args: ValidatorArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rs_input: ScheduleReconciliationInput =
        input::load(args.input.as_deref(), "reconcile-schedule")?;
    let result = schedule::reconcile_schedule(&rs_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_consistency(args: ValidatorArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let c_input: ConsistencyInput = input::load(args.input.as_deref(), "consistency")?;
    let result = consistency::check_assumption_consistency(&c_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_verify_export(args: ValidatorArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ev_input: ExportVerificationInput = input::load(args.input.as_deref(), "verify-export")?;
    let result = export::verify_export(&ev_input)?;
    Ok(serde_json::to_value(result)?)
}
