use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use proforma_core::financing::amortization::{self, AmortizationInput};
use proforma_core::financing::calculators::{
    self, DebtYieldInput, DscrInput, FinancingSensitivityInput,
};
use proforma_core::financing::prepayment::{self, PrepaymentInput};
use proforma_core::rounding::RoundingPolicy;

use crate::input;

/// Arguments for an amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (e.g. 0.065)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization period in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Month in which the remaining balance is repaid as a balloon
    #[arg(long)]
    pub balloon_month: Option<u32>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => AmortizationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            amortization_years: args.years.ok_or("--years is required (or provide --input)")?,
            balloon_month: args.balloon_month,
            rounding: RoundingPolicy::default(),
        },
    };
    let result = amortization::build_amortization(&amort_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for debt service coverage
#[derive(Args)]
pub struct DscrArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual net operating income
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Loan amount
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization period in years
    #[arg(long, default_value = "25")]
    pub years: u32,

    /// Property value, for LTV
    #[arg(long)]
    pub value: Option<Decimal>,

    /// Target DSCR used for loan sizing
    #[arg(long)]
    pub target: Option<Decimal>,
}

pub fn run_dscr(args: DscrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dscr_input: DscrInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => DscrInput {
            noi: args.noi.ok_or("--noi is required (or provide --input)")?,
            loan_amount: args.loan.ok_or("--loan is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            amortization_years: args.years,
            property_value: args.value,
            target_dscr: args.target.unwrap_or(dec!(1.25)),
        },
    };
    let result = calculators::calculate_dscr(&dscr_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for debt yield
#[derive(Args)]
pub struct DebtYieldArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual net operating income
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Loan amount
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Lender's minimum debt yield
    #[arg(long)]
    pub minimum: Option<Decimal>,
}

pub fn run_debt_yield(args: DebtYieldArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dy_input: DebtYieldInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => DebtYieldInput {
            noi: args.noi.ok_or("--noi is required (or provide --input)")?,
            loan_amount: args.loan.ok_or("--loan is required (or provide --input)")?,
            minimum_debt_yield: args.minimum.unwrap_or(dec!(0.09)),
        },
    };
    let result = calculators::calculate_debt_yield(&dy_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the rate / NOI stress grid
#[derive(Args)]
pub struct FinancingSensitivityArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_financing_sensitivity(
    args: FinancingSensitivityArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let fs_input: FinancingSensitivityInput =
        input::load(args.input.as_deref(), "financing sensitivity")?;
    let result = calculators::run_financing_sensitivity(&fs_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for prepayment pricing
#[derive(Args)]
pub struct PrepaymentArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_prepayment(args: PrepaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pp_input: PrepaymentInput = input::load(args.input.as_deref(), "prepayment")?;
    let result = prepayment::calculate_prepayment(&pp_input)?;
    Ok(serde_json::to_value(result)?)
}
