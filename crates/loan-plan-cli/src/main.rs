mod commands;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::optimize::OptimizeArgs;
use commands::schedule::ScheduleArgs;

/// French-system loan planner
#[derive(Parser)]
#[command(
    name = "lpo",
    version,
    about = "French-system loan schedules and installment-count optimisation",
    long_about = "Builds level-installment amortisation schedules with fees and tax, \
                  reports the annualised financial cost (CFT), and searches a range of \
                  installment counts for the cheapest plan whose mean payment fits a cap."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "loan_plan_core=debug")
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the amortisation schedule for a fixed number of installments
    Schedule(ScheduleArgs),
    /// Find the installment count with the lowest CFT under a payment cap
    Optimize(OptimizeArgs),
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

    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    tracing::debug!(output = ?cli.output, "dispatching command");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Optimize(args) => commands::optimize::run_optimize(args),
        Commands::Version => {
            println!("lpo {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            if let Err(e) = output::format_output(&cli.output, &value) {
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
