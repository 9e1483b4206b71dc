use clap::Args;
use serde_json::Value;

use proforma_core::audit::engine::{self, VerificationInput};

use crate::input;

/// Arguments for independent cross-verification
#[derive(Args)]
pub struct VerifyArgs {
    /// Path to JSON/YAML input file ({ global, properties, external_actuals? })
    #[arg(long)]
    pub input: Option<String>,

    /// Keep only failed checks in each entity report
    #[arg(long)]
    pub findings_only: bool,
}

pub fn run_verify(args: VerifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let v_input: VerificationInput = input::load(args.input.as_deref(), "verify")?;
    let mut result = engine::run_independent_verification(&v_input)?;
    if args.findings_only {
        let report = &mut result.result;
        for entity in report
            .property_reports
            .iter_mut()
            .chain(report.company_report.iter_mut())
            .chain(std::iter::once(&mut report.consolidated_report))
        {
            entity.checks.retain(|c| !c.passed);
        }
    }
    Ok(serde_json::to_value(result)?)
}
