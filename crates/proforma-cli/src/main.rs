mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::audit::VerifyArgs;
use commands::financing::{
    AmortizeArgs, DebtYieldArgs, DscrArgs, FinancingSensitivityArgs, PrepaymentArgs,
};
use commands::portfolio::{CompareScenariosArgs, ConsolidateArgs};
use commands::proforma::{SimulateArgs, SimulateCompanyArgs};
use commands::returns::{
    BreakEvenArgs, DcfArgs, EquityMultipleArgs, ExitValuationArgs, IrrVectorArgs,
};
use commands::validation::ValidatorArgs;

/// Hospitality pro-forma projections and independent verification
#[derive(Parser)]
#[command(
    name = "hpf",
    version,
    about = "Hospitality pro-forma projections and independent verification",
    long_about = "A CLI for projecting boutique hotel portfolios month by month with decimal \
                  precision. Covers debt schedules, returns, consistency validators, \
                  cross-verification audits, consolidation and scenario comparison."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project one property month by month
    Simulate(SimulateArgs),
    /// Project a portfolio and the management company earning its fees
    SimulateCompany(SimulateCompanyArgs),
    /// Build a level-payment amortization schedule
    Amortize(AmortizeArgs),
    /// Debt service coverage ratio and loan sizing
    Dscr(DscrArgs),
    /// Debt yield and loan sizing to a minimum
    DebtYield(DebtYieldArgs),
    /// DSCR under interest rate and NOI shocks
    FinancingSensitivity(FinancingSensitivityArgs),
    /// Price an early loan payoff
    Prepayment(PrepaymentArgs),
    /// Discounted cash flow with NPV and IRR
    Dcf(DcfArgs),
    /// Assemble and validate an equity IRR cash-flow vector
    IrrVector(IrrVectorArgs),
    /// Equity multiple from equity cash flows
    EquityMultiple(EquityMultipleArgs),
    /// Sale price and net proceeds at exit
    ExitValuation(ExitValuationArgs),
    /// Break-even occupancy
    BreakEven(BreakEvenArgs),
    /// Check accounting identities for one period
    Identities(ValidatorArgs),
    /// Check funding, cash and debt gates for an entity
    FundingGates(ValidatorArgs),
    /// Reconcile two amortization schedules
    ReconcileSchedule(ValidatorArgs),
    /// Scan an assumption snapshot for inconsistencies
    Consistency(ValidatorArgs),
    /// Verify an export's sections and sampled values
    VerifyExport(ValidatorArgs),
    /// Cross-verify the simulator against an independent derivation
    Verify(VerifyArgs),
    /// Consolidate property and management company statements
    Consolidate(ConsolidateArgs),
    /// Compare an alternative scenario with a baseline
    CompareScenarios(CompareScenariosArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "proforma_core=debug,hpf=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::proforma::run_simulate(args),
        Commands::SimulateCompany(args) => commands::proforma::run_simulate_company(args),
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::Dscr(args) => commands::financing::run_dscr(args),
        Commands::DebtYield(args) => commands::financing::run_debt_yield(args),
        Commands::FinancingSensitivity(args) => {
            commands::financing::run_financing_sensitivity(args)
        }
        Commands::Prepayment(args) => commands::financing::run_prepayment(args),
        Commands::Dcf(args) => commands::returns::run_dcf(args),
        Commands::IrrVector(args) => commands::returns::run_irr_vector(args),
        Commands::EquityMultiple(args) => commands::returns::run_equity_multiple(args),
        Commands::ExitValuation(args) => commands::returns::run_exit_valuation(args),
        Commands::BreakEven(args) => commands::returns::run_break_even(args),
        Commands::Identities(args) => commands::validation::run_identities(args),
        Commands::FundingGates(args) => commands::validation::run_funding_gates(args),
        Commands::ReconcileSchedule(args) => commands::validation::run_reconcile_schedule(args),
        Commands::Consistency(args) => commands::validation::run_consistency(args),
        Commands::VerifyExport(args) => commands::validation::run_verify_export(args),
        Commands::Verify(args) => commands::audit::run_verify(args),
        Commands::Consolidate(args) => commands::portfolio::run_consolidate(args),
        Commands::CompareScenarios(args) => commands::portfolio::run_compare_scenarios(args),
        Commands::Version => {
            println!("hpf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
