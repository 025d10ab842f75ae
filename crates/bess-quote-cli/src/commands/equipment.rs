use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use bess_quote_core::equipment::{build_equipment_breakdown, InstallOptions, RenewablesOptions};
use bess_quote_core::pricing::PricingCatalog;
use bess_quote_core::sizing::PowerSizingResult;

use crate::input;

/// Arguments for equipment pricing
#[derive(Args)]
pub struct EquipmentArgs {
    /// Path to JSON input file: {"sizing": <size output>, "renewables": {...}, "install": {...}}
    #[arg(long)]
    pub input: Option<String>,

    /// Override the recommended storage duration (hours)
    #[arg(long)]
    pub duration_hours: Option<Decimal>,

    /// Price as of this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<chrono::NaiveDate>,
}

#[derive(Deserialize)]
struct EquipmentRequest {
    sizing: PowerSizingResult,
    #[serde(default)]
    renewables: RenewablesOptions,
    #[serde(default)]
    install: InstallOptions,
}

pub fn run_equipment(args: EquipmentArgs, catalog: &PricingCatalog) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: EquipmentRequest = input::read_request(args.input.as_deref(), "equipment")?;
    if args.duration_hours.is_some() {
        request.install.duration_hours_override = args.duration_hours;
    }
    if args.as_of.is_some() {
        request.install.as_of = args.as_of;
    }

    let result = build_equipment_breakdown(&request.sizing, &request.renewables, &request.install, catalog)?;
    Ok(serde_json::to_value(result)?)
}
