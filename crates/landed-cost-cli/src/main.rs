mod commands;
mod demo;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::calculate::CalculateArgs;
use commands::hunt::HuntArgs;
use commands::preference::PreferenceArgs;
use commands::risks::RisksArgs;

/// Landed-cost estimation for South African imports
#[derive(Parser)]
#[command(
    name = "lcost",
    version,
    about = "Landed-cost estimation for South African imports",
    long_about = "Estimate the full landed cost of importing goods into South Africa \
                  with decimal precision: customs duty, import VAT, ancillary fees, \
                  trade-preference resolution, compliance screening, and a smart \
                  rate hunt across alternative sourcing origins."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the landed cost of one shipment
    Calculate(CalculateArgs),
    /// Re-run the calculation across alternative origins and rank savings
    Hunt(HuntArgs),
    /// Screen a shipment against the compliance rule table
    AssessRisks(RisksArgs),
    /// Resolve the best preferential duty rate for an HS code and origin
    Preference(PreferenceArgs),
    /// List the trade agreements in the reference dataset
    Agreements,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Minimal,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::calculate::run_calculate(args),
        Commands::Hunt(args) => commands::hunt::run_hunt(args),
        Commands::AssessRisks(args) => commands::risks::run_assess_risks(args),
        Commands::Preference(args) => commands::preference::run_preference(args),
        Commands::Agreements => commands::preference::run_agreements(),
        Commands::Version => {
            println!("lcost {}", env!("CARGO_PKG_VERSION"));
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
