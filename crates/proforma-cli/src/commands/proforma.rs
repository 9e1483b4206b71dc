use clap::Args;
use serde_json::Value;

use proforma_core::proforma::company::{self, CompanyInput};
use proforma_core::proforma::simulator::{self, SimulationInput};

use crate::input;

/// Arguments for a single-property projection
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON/YAML input file ({ global, property })
    #[arg(long)]
    pub input: Option<String>,

    /// Emit annual roll-ups only, without the monthly records
    #[arg(long)]
    pub annual: bool,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = input::load(args.input.as_deref(), "simulate")?;
    let result = simulator::simulate_property(&sim_input)?;
    let mut value = serde_json::to_value(result)?;
    if args.annual {
        if let Some(Value::Object(res)) = value.get_mut("result") {
            res.remove("records");
        }
    }
    Ok(value)
}

/// Arguments for a portfolio plus management company projection
#[derive(Args)]
pub struct SimulateCompanyArgs {
    /// Path to JSON/YAML input file ({ global, properties })
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_simulate_company(
    args: SimulateCompanyArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let co_input: CompanyInput = input::load(args.input.as_deref(), "simulate-company")?;
    let result = company::simulate_company_projection(&co_input)?;
    Ok(serde_json::to_value(result)?)
}
