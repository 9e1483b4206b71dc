use clap::Args;
use serde_json::Value;

use proforma_core::portfolio::consolidation::{self, ConsolidationInput};
use proforma_core::portfolio::scenario::{self, ScenarioComparisonInput};

use crate::input;

/// Arguments for statement consolidation
#[derive(Args)]
pub struct ConsolidateArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_consolidate(args: ConsolidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let c_input: ConsolidationInput = input::load(args.input.as_deref(), "consolidate")?;
    let result = consolidation::consolidate_statements(&c_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for baseline vs alternative comparison
#[derive(Args)]
pub struct CompareScenariosArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare_scenarios(
    args: CompareScenariosArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let s_input: ScenarioComparisonInput =
        input::load(args.input.as_deref(), "compare-scenarios")?;
    let result = scenario::compare_scenarios(&s_input)?;
    Ok(serde_json::to_value(result)?)
}
