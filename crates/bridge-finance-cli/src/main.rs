mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bridge::DealArgs;
use commands::sensitivity::SensitivityArgs;

/// Invoice bridge financing margin calculator
#[derive(Parser)]
#[command(
    name = "bfc",
    version,
    about = "See how much of an invoice's margin is consumed by bridge financing",
    long_about = "A CLI for working out the cost of short-term bank financing drawn \
                  against an invoice, with decimal precision. Reports interest, fees, \
                  net margin after financing, margin erosion and effective annualized \
                  cost, plus labelled breakdowns and sensitivity grids."
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
    /// Calculate bridge financing economics for one invoice
    Bridge(DealArgs),
    /// Labelled breakdown of the financing economics
    Breakdown(DealArgs),
    /// Sweep one or two deal parameters against a result metric
    Sensitivity(SensitivityArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Bridge(args) => commands::bridge::run_bridge(args),
        Commands::Breakdown(args) => commands::bridge::run_breakdown(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("bfc {}", env!("CARGO_PKG_VERSION"));
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
