use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use bess_quote_core::equipment::EquipmentBreakdown;
use bess_quote_core::financials::{calculate_financials, AdvancedOptions, MarketContext};

use crate::input;

/// Arguments for the financial model
#[derive(Args)]
pub struct FinancialsArgs {
    /// Path to JSON input file: {"breakdown": <equipment output>, "market": {...}, "advanced": {...}}
    #[arg(long)]
    pub input: Option<String>,

    /// Run the lifetime model with default assumptions when the input has none
    #[arg(long)]
    pub advanced: bool,

    /// Add the NPV tornado (implies --advanced)
    #[arg(long)]
    pub sensitivity: bool,

    /// Add optimistic / base / pessimistic scenarios (implies --advanced)
    #[arg(long)]
    pub scenarios: bool,
}

#[derive(Deserialize)]
struct FinancialsRequest {
    breakdown: EquipmentBreakdown,
    market: MarketContext,
    #[serde(default)]
    advanced: Option<AdvancedOptions>,
}

pub fn run_financials(args: FinancialsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: FinancialsRequest = input::read_request(args.input.as_deref(), "financials")?;

    let mut advanced = request.advanced;
    if args.advanced || args.sensitivity || args.scenarios {
        let options = advanced.get_or_insert_with(AdvancedOptions::default);
        options.include_sensitivity |= args.sensitivity;
        options.include_scenarios |= args.scenarios;
    }

    let result = calculate_financials(&request.breakdown, &request.market, advanced.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
