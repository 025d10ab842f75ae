mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::borrow::Cow;
use std::process;

use bess_quote_core::pricing::PricingCatalog;

use commands::equipment::EquipmentArgs;
use commands::financials::FinancialsArgs;
use commands::pricing::{PriceArgs, PricingArgs};
use commands::quote::QuoteArgs;
use commands::ravs::RavsArgs;
use commands::sizing::SizeArgs;

/// Battery energy-storage quote calculations
#[derive(Parser)]
#[command(
    name = "bessq",
    version,
    about = "Battery energy-storage quote calculations",
    long_about = "Size a battery system from facility answers, price it against tiered \
                  equipment tables, project savings and lifetime financials, and score \
                  the result on the Risk-Adjusted Value Score (RAVS). JSON in, JSON, \
                  table, CSV or a single headline value out."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Pricing catalog to use instead of the built-in tables (.json, .yaml or .yml)
    #[arg(long, global = true)]
    pricing: Option<String>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Size peak power and storage duration for a facility
    Size(SizeArgs),
    /// Price the equipment for a sized system
    Equipment(EquipmentArgs),
    /// Savings, payback, ROI and (optionally) lifetime financials
    Financials(FinancialsArgs),
    /// Risk-Adjusted Value Score for a financial result
    Ravs(RavsArgs),
    /// Run the whole pipeline: size, price, evaluate and score
    Quote(QuoteArgs),
    /// Resolve one unit price from the pricing catalog
    Price(PriceArgs),
    /// Print the pricing catalog in use
    Pricing(PricingArgs),
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

fn load_catalog(path: Option<&str>) -> Result<Cow<'static, PricingCatalog>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Cow::Owned(input::file::read_pricing(p)?)),
        None => Ok(Cow::Borrowed(PricingCatalog::standard())),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> =
        load_catalog(cli.pricing.as_deref()).and_then(|catalog| match cli.command {
            Commands::Size(args) => commands::sizing::run_size(args),
            Commands::Equipment(args) => commands::equipment::run_equipment(args, &catalog),
            Commands::Financials(args) => commands::financials::run_financials(args),
            Commands::Ravs(args) => commands::ravs::run_ravs(args),
            Commands::Quote(args) => commands::quote::run_quote(args, &catalog),
            Commands::Price(args) => commands::pricing::run_price(args, &catalog),
            Commands::Pricing(args) => commands::pricing::run_pricing(args, &catalog),
            Commands::Version => {
                println!(
                    "bessq {} (formulas {})",
                    env!("CARGO_PKG_VERSION"),
                    bess_quote_core::FORMULA_VERSION
                );
                process::exit(0);
            }
        });

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
