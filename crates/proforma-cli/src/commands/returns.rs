use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use proforma_core::returns::break_even::{self, BreakEvenInput};
use proforma_core::returns::dcf::{self, DcfInput};
use proforma_core::returns::equity_multiple::{self, EquityMultipleInput};
use proforma_core::returns::exit::{self, ExitValuationInput};
use proforma_core::returns::irr_vector::{self, IrrVectorInput};
use proforma_core::rounding::RoundingPolicy;

use crate::input;

/// Arguments for a discounted cash flow
#[derive(Args)]
pub struct DcfArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Period cash flows, t = 0 first (comma-separated, e.g. "-1000,400,400,400")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate per period
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// IRR to confirm against the flows
    #[arg(long)]
    pub candidate_irr: Option<Decimal>,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dcf_input: DcfInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => DcfInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            discount_rate: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            candidate_irr: args.candidate_irr,
            irr_tolerance: dec!(1),
        },
    };
    let result = dcf::calculate_dcf(&dcf_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the equity IRR vector
#[derive(Args)]
pub struct IrrVectorArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_irr_vector(args: IrrVectorArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let iv_input: IrrVectorInput = input::load(args.input.as_deref(), "irr-vector")?;
    let result = irr_vector::build_irr_vector(&iv_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the equity multiple
#[derive(Args)]
pub struct EquityMultipleArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Equity cash flows (comma-separated; contributions negative)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_equity_multiple(args: EquityMultipleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let em_input: EquityMultipleInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => EquityMultipleInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
        },
    };
    let result = equity_multiple::calculate_equity_multiple(&em_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for an exit valuation
#[derive(Args)]
pub struct ExitValuationArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Stabilized annual NOI
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Exit capitalisation rate
    #[arg(long)]
    pub cap_rate: Option<Decimal>,

    /// Broker commission as a share of the sale price
    #[arg(long, default_value = "0.02")]
    pub commission: Decimal,

    /// Closing costs as a share of the sale price
    #[arg(long, default_value = "0")]
    pub closing_costs: Decimal,

    /// Debt repaid from the proceeds
    #[arg(long, default_value = "0")]
    pub debt: Decimal,
}

pub fn run_exit_valuation(args: ExitValuationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ev_input: ExitValuationInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => ExitValuationInput {
            stabilized_noi: args.noi.ok_or("--noi is required (or provide --input)")?,
            exit_cap_rate: args
                .cap_rate
                .ok_or("--cap-rate is required (or provide --input)")?,
            sales_commission_rate: args.commission,
            closing_cost_rate: args.closing_costs,
            outstanding_debt: args.debt,
            rounding: RoundingPolicy::default(),
        },
    };
    let result = exit::calculate_exit_valuation(&ev_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for break-even occupancy
#[derive(Args)]
pub struct BreakEvenArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Number of rooms
    #[arg(long)]
    pub rooms: Option<u32>,

    /// Average daily rate
    #[arg(long)]
    pub adr: Option<Decimal>,

    /// Variable cost as a share of revenue
    #[arg(long)]
    pub variable_cost_rate: Option<Decimal>,

    /// Monthly fixed costs
    #[arg(long)]
    pub fixed_costs: Option<Decimal>,

    /// Base management fee rate
    #[arg(long, default_value = "0.05")]
    pub management_fee_rate: Decimal,

    /// FF&E reserve rate
    #[arg(long, default_value = "0.04")]
    pub ffe_reserve_rate: Decimal,

    /// Ancillary revenue as a share of room revenue
    #[arg(long, default_value = "0")]
    pub ancillary_pct: Decimal,

    /// Monthly debt service, for the cash-flow break-even
    #[arg(long)]
    pub debt_service: Option<Decimal>,

    /// Current occupancy, for margin of safety and break-even ADR
    #[arg(long)]
    pub occupancy: Option<Decimal>,
}

pub fn run_break_even(args: BreakEvenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let be_input: BreakEvenInput = match input::try_load(args.input.as_deref())? {
        Some(i) => i,
        None => BreakEvenInput {
            room_count: args.rooms.ok_or("--rooms is required (or provide --input)")?,
            adr: args.adr.ok_or("--adr is required (or provide --input)")?,
            days_per_month: dec!(30.5),
            ancillary_pct: args.ancillary_pct,
            variable_cost_rate: args
                .variable_cost_rate
                .ok_or("--variable-cost-rate is required (or provide --input)")?,
            management_fee_rate: args.management_fee_rate,
            ffe_reserve_rate: args.ffe_reserve_rate,
            fixed_costs: args
                .fixed_costs
                .ok_or("--fixed-costs is required (or provide --input)")?,
            monthly_debt_service: args.debt_service,
            monthly_tax_estimate: None,
            current_occupancy: args.occupancy,
        },
    };
    let result = break_even::calculate_break_even(&be_input)?;
    Ok(serde_json::to_value(result)?)
}
